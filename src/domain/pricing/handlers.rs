use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::AppContext;
use crate::domain::catalog::Product;
use crate::domain::common::guard;
use crate::error::AppError;
use crate::mediator::{MediatorBuilder, RequestHandler, RequestMeta};
use crate::persistence::Criteria;
use super::commands::*;
use super::dto::{B2bPriceDto, PriceListDto};
use super::model::{NewPriceList, PriceList, PriceListEntry};
use super::queries::*;

pub struct PricingHandlers {
    ctx: AppContext,
}

impl PricingHandlers {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    async fn load(&self, price_list_id: Uuid) -> Result<PriceList, AppError> {
        self.ctx.data.set::<PriceList>().get(price_list_id, "PriceList").await
    }

    async fn save(&self, mut list: PriceList, meta: &RequestMeta) -> Result<PriceListDto, AppError> {
        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.update(&mut list)?;
        uow.save_changes().await?;
        Ok(PriceListDto::from(&list))
    }
}

pub fn register(builder: &mut MediatorBuilder, ctx: &AppContext) {
    let handlers = Arc::new(PricingHandlers::new(ctx.clone()));
    builder.register::<CreatePriceList>(handlers.clone());
    builder.register::<SetPriceListEntry>(handlers.clone());
    builder.register::<RemovePriceListEntry>(handlers.clone());
    builder.register::<ActivatePriceList>(handlers.clone());
    builder.register::<DeactivatePriceList>(handlers.clone());
    builder.register::<GetPriceList>(handlers.clone());
    builder.register::<ResolveB2bPrice>(handlers);
}

// ============================================================================
// Commands
// ============================================================================

#[async_trait]
impl RequestHandler<CreatePriceList> for PricingHandlers {
    async fn handle(&self, request: &CreatePriceList, meta: &RequestMeta) -> Result<PriceListDto, AppError> {
        let mut list = PriceList::create(NewPriceList {
            company_id: request.company_id,
            name: &request.name,
            currency: &request.currency,
            valid_from: request.valid_from,
            valid_until: request.valid_until,
        })?;

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.add(&mut list)?;
        uow.save_changes().await?;

        tracing::info!(price_list_id = %list.base.id, company_id = %list.company_id, "Price list created");
        Ok(PriceListDto::from(&list))
    }
}

#[async_trait]
impl RequestHandler<SetPriceListEntry> for PricingHandlers {
    async fn handle(&self, request: &SetPriceListEntry, meta: &RequestMeta) -> Result<PriceListDto, AppError> {
        let mut list = self.load(request.price_list_id).await?;
        self.ctx
            .data
            .set::<Product>()
            .get(request.product_id, "Product")
            .await?;

        let entry = PriceListEntry::new(request.product_id, request.unit_price, request.tiers.clone())?;
        list.set_entry(entry);
        self.save(list, meta).await
    }
}

#[async_trait]
impl RequestHandler<RemovePriceListEntry> for PricingHandlers {
    async fn handle(&self, request: &RemovePriceListEntry, meta: &RequestMeta) -> Result<PriceListDto, AppError> {
        let mut list = self.load(request.price_list_id).await?;
        list.remove_entry(request.product_id)?;
        self.save(list, meta).await
    }
}

#[async_trait]
impl RequestHandler<ActivatePriceList> for PricingHandlers {
    async fn handle(&self, request: &ActivatePriceList, meta: &RequestMeta) -> Result<PriceListDto, AppError> {
        let mut list = self.load(request.price_list_id).await?;
        list.activate()?;
        self.save(list, meta).await
    }
}

#[async_trait]
impl RequestHandler<DeactivatePriceList> for PricingHandlers {
    async fn handle(&self, request: &DeactivatePriceList, meta: &RequestMeta) -> Result<PriceListDto, AppError> {
        let mut list = self.load(request.price_list_id).await?;
        list.deactivate();
        self.save(list, meta).await
    }
}

// ============================================================================
// Queries
// ============================================================================

#[async_trait]
impl RequestHandler<GetPriceList> for PricingHandlers {
    async fn handle(&self, request: &GetPriceList, _meta: &RequestMeta) -> Result<Option<PriceListDto>, AppError> {
        let list = self.ctx.data.set::<PriceList>().find(request.price_list_id).await?;
        Ok(list.as_ref().map(PriceListDto::from))
    }
}

#[async_trait]
impl RequestHandler<ResolveB2bPrice> for PricingHandlers {
    async fn handle(&self, request: &ResolveB2bPrice, _meta: &RequestMeta) -> Result<B2bPriceDto, AppError> {
        let product = self
            .ctx
            .data
            .set::<Product>()
            .get(request.product_id, "Product")
            .await?;
        let at = request.at.unwrap_or_else(Utc::now);

        let lists = self
            .ctx
            .data
            .set::<PriceList>()
            .all(
                Criteria::new()
                    .eq("company_id", request.company_id)
                    .eq("is_active", true)
                    .oldest_first(),
            )
            .await?;

        // Lowest effective price wins; ties keep the older list.
        let mut best: Option<(Uuid, &PriceListEntry, i64)> = None;
        for list in lists.iter().filter(|l| l.is_valid_at(at)) {
            let Some(entry) = list.entry(request.product_id) else {
                continue;
            };
            let price = entry.effective_price(request.quantity);
            if best.map_or(true, |(_, _, current)| price < current) {
                best = Some((list.base.id, entry, price));
            }
        }

        let (price_list_id, unit_price, discount_percent) = match best {
            Some((list_id, entry, price)) => (
                Some(list_id),
                price,
                entry
                    .tier_for(request.quantity)
                    .map(|t| t.discount_percent)
                    .unwrap_or(0.0),
            ),
            None => (None, product.price, 0.0),
        };

        tracing::debug!(
            company_id = %request.company_id,
            product_id = %request.product_id,
            quantity = request.quantity,
            unit_price,
            source = ?price_list_id,
            "Resolved B2B price"
        );

        let total = guard::line_total(unit_price, request.quantity, "quantity")?;

        Ok(B2bPriceDto {
            product_id: request.product_id,
            company_id: request.company_id,
            quantity: request.quantity,
            catalog_price: product.price,
            unit_price,
            total,
            price_list_id,
            discount_percent,
        })
    }
}

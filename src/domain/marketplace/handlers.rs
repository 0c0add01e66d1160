use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::AppContext;
use crate::domain::common::PagedResult;
use crate::error::AppError;
use crate::mediator::{MediatorBuilder, RequestHandler, RequestMeta};
use crate::persistence::Criteria;
use super::commands::*;
use super::dto::{SellerDto, StoreDto};
use super::errors::MarketplaceError;
use super::model::{Seller, SellerStatus, Store};
use super::queries::*;

pub struct MarketplaceHandlers {
    ctx: AppContext,
}

impl MarketplaceHandlers {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    async fn load_seller(&self, seller_id: Uuid) -> Result<Seller, AppError> {
        self.ctx.data.set::<Seller>().get(seller_id, "Seller").await
    }

    async fn save_seller(&self, mut seller: Seller, meta: &RequestMeta) -> Result<SellerDto, AppError> {
        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.update(&mut seller)?;
        uow.save_changes().await?;
        Ok(SellerDto::from(&seller))
    }
}

pub fn register(builder: &mut MediatorBuilder, ctx: &AppContext) {
    let handlers = Arc::new(MarketplaceHandlers::new(ctx.clone()));
    builder.register::<RegisterSeller>(handlers.clone());
    builder.register::<ApproveSeller>(handlers.clone());
    builder.register::<RejectSeller>(handlers.clone());
    builder.register::<SuspendSeller>(handlers.clone());
    builder.register::<ReinstateSeller>(handlers.clone());
    builder.register::<DeleteSeller>(handlers.clone());
    builder.register::<OpenStore>(handlers.clone());
    builder.register::<CloseStore>(handlers.clone());
    builder.register::<GetSellerById>(handlers.clone());
    builder.register::<ListSellers>(handlers.clone());
    builder.register::<ListSellerStores>(handlers);
}

// ============================================================================
// Seller Commands
// ============================================================================

#[async_trait]
impl RequestHandler<RegisterSeller> for MarketplaceHandlers {
    async fn handle(&self, request: &RegisterSeller, meta: &RequestMeta) -> Result<SellerDto, AppError> {
        // A rejected application does not block a new one.
        let existing = self
            .ctx
            .data
            .set::<Seller>()
            .all(Criteria::new().eq("owner_user_id", request.owner_user_id))
            .await?;
        if existing.iter().any(|s| s.status != SellerStatus::Rejected) {
            return Err(MarketplaceError::SellerAlreadyRegistered(request.owner_user_id).into());
        }

        let mut seller = Seller::register(
            request.owner_user_id,
            &request.business_name,
            &request.contact_email,
        )?;

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.add(&mut seller)?;
        uow.save_changes().await?;

        tracing::info!(seller_id = %seller.base.id, owner = %seller.owner_user_id, "Seller registered");
        Ok(SellerDto::from(&seller))
    }
}

#[async_trait]
impl RequestHandler<ApproveSeller> for MarketplaceHandlers {
    async fn handle(&self, request: &ApproveSeller, meta: &RequestMeta) -> Result<SellerDto, AppError> {
        let mut seller = self.load_seller(request.seller_id).await?;
        seller.approve(request.commission_rate)?;
        tracing::info!(seller_id = %seller.base.id, commission_rate = seller.commission_rate, "Seller approved");
        self.save_seller(seller, meta).await
    }
}

#[async_trait]
impl RequestHandler<RejectSeller> for MarketplaceHandlers {
    async fn handle(&self, request: &RejectSeller, meta: &RequestMeta) -> Result<SellerDto, AppError> {
        let mut seller = self.load_seller(request.seller_id).await?;
        seller.reject(&request.reason)?;
        self.save_seller(seller, meta).await
    }
}

#[async_trait]
impl RequestHandler<SuspendSeller> for MarketplaceHandlers {
    async fn handle(&self, request: &SuspendSeller, meta: &RequestMeta) -> Result<SellerDto, AppError> {
        let mut seller = self.load_seller(request.seller_id).await?;
        seller.suspend(&request.reason)?;
        tracing::warn!(seller_id = %seller.base.id, reason = %request.reason, "Seller suspended");
        self.save_seller(seller, meta).await
    }
}

#[async_trait]
impl RequestHandler<ReinstateSeller> for MarketplaceHandlers {
    async fn handle(&self, request: &ReinstateSeller, meta: &RequestMeta) -> Result<SellerDto, AppError> {
        let mut seller = self.load_seller(request.seller_id).await?;
        seller.reinstate()?;
        self.save_seller(seller, meta).await
    }
}

#[async_trait]
impl RequestHandler<DeleteSeller> for MarketplaceHandlers {
    async fn handle(&self, request: &DeleteSeller, meta: &RequestMeta) -> Result<bool, AppError> {
        let Some(mut seller) = self.ctx.data.set::<Seller>().find(request.seller_id).await? else {
            return Ok(false);
        };
        if !seller.mark_as_deleted() {
            return Ok(false);
        }
        self.save_seller(seller, meta).await?;
        Ok(true)
    }
}

// ============================================================================
// Store Commands
// ============================================================================

#[async_trait]
impl RequestHandler<OpenStore> for MarketplaceHandlers {
    async fn handle(&self, request: &OpenStore, meta: &RequestMeta) -> Result<StoreDto, AppError> {
        let seller = self.load_seller(request.seller_id).await?;
        let mut store = Store::open(
            &seller,
            &request.name,
            &request.slug,
            request.description.as_deref(),
        )?;

        let slug_taken = self
            .ctx
            .data
            .set::<Store>()
            .exists(Criteria::new().eq("slug", &store.slug).include_deleted())
            .await?;
        if slug_taken {
            return Err(MarketplaceError::DuplicateStoreSlug(store.slug).into());
        }

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.add(&mut store)?;
        uow.save_changes().await?;

        tracing::info!(store_id = %store.base.id, seller_id = %seller.base.id, "Store opened");
        Ok(StoreDto::from(&store))
    }
}

#[async_trait]
impl RequestHandler<CloseStore> for MarketplaceHandlers {
    async fn handle(&self, request: &CloseStore, meta: &RequestMeta) -> Result<StoreDto, AppError> {
        let mut store = self.ctx.data.set::<Store>().get(request.store_id, "Store").await?;
        store.close();

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.update(&mut store)?;
        uow.save_changes().await?;
        Ok(StoreDto::from(&store))
    }
}

// ============================================================================
// Queries
// ============================================================================

#[async_trait]
impl RequestHandler<GetSellerById> for MarketplaceHandlers {
    async fn handle(&self, request: &GetSellerById, _meta: &RequestMeta) -> Result<Option<SellerDto>, AppError> {
        let seller = self.ctx.data.set::<Seller>().find(request.seller_id).await?;
        Ok(seller.as_ref().map(SellerDto::from))
    }
}

#[async_trait]
impl RequestHandler<ListSellers> for MarketplaceHandlers {
    async fn handle(&self, request: &ListSellers, _meta: &RequestMeta) -> Result<PagedResult<SellerDto>, AppError> {
        let page = self.ctx.settings.page(request.page);
        let criteria = Criteria::new()
            .eq_opt("status", request.status)
            .order_by("business_name", false);

        let sellers = self.ctx.data.set::<Seller>().paged(criteria, page).await?;
        Ok(sellers.map(|s| SellerDto::from(&s)))
    }
}

#[async_trait]
impl RequestHandler<ListSellerStores> for MarketplaceHandlers {
    async fn handle(&self, request: &ListSellerStores, _meta: &RequestMeta) -> Result<Vec<StoreDto>, AppError> {
        let mut criteria = Criteria::new()
            .eq("seller_id", request.seller_id)
            .oldest_first();
        if !request.include_closed {
            criteria = criteria.eq("is_active", true);
        }

        let stores = self.ctx.data.set::<Store>().all(criteria).await?;
        Ok(stores.iter().map(StoreDto::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{app, TestApp};

    async fn registered(app: &TestApp) -> SellerDto {
        app.mediator
            .send(RegisterSeller {
                owner_user_id: Uuid::new_v4(),
                business_name: "Acme Goods".to_string(),
                contact_email: "sales@acme.com".to_string(),
            })
            .await
            .unwrap()
    }

    async fn approved(app: &TestApp) -> SellerDto {
        let seller = registered(app).await;
        app.mediator
            .send(ApproveSeller {
                seller_id: seller.id,
                commission_rate: 8.0,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_one_seller_account_per_user() {
        let app = app();
        let seller = registered(&app).await;

        let duplicate = RegisterSeller {
            owner_user_id: seller.owner_user_id,
            business_name: "Acme Two".to_string(),
            contact_email: "two@acme.com".to_string(),
        };
        let err = app.mediator.send(duplicate.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));

        app.mediator
            .send(RejectSeller {
                seller_id: seller.id,
                reason: "Missing tax id".to_string(),
            })
            .await
            .unwrap();
        let second = app.mediator.send(duplicate).await.unwrap();
        assert_eq!(second.status, SellerStatus::PendingReview);
    }

    #[tokio::test]
    async fn test_review_flow_emits_events() {
        let app = app();
        let seller = approved(&app).await;
        assert_eq!(seller.status, SellerStatus::Approved);
        assert!(seller.approved_at.is_some());

        app.mediator
            .send(SuspendSeller {
                seller_id: seller.id,
                reason: "Chargebacks".to_string(),
            })
            .await
            .unwrap();
        let reinstated = app
            .mediator
            .send(ReinstateSeller { seller_id: seller.id })
            .await
            .unwrap();
        assert_eq!(reinstated.status, SellerStatus::Approved);

        assert_eq!(
            app.outbox_event_types().await,
            vec!["SellerRegistered", "SellerApproved", "SellerSuspended", "SellerReinstated"]
        );
    }

    #[tokio::test]
    async fn test_open_store_rules() {
        let app = app();
        let pending = registered(&app).await;
        let err = app
            .mediator
            .send(OpenStore {
                seller_id: pending.id,
                name: "Acme".to_string(),
                slug: "acme".to_string(),
                description: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Seller must be approved to open a store");

        let seller = approved(&app).await;
        let open = OpenStore {
            seller_id: seller.id,
            name: "Acme".to_string(),
            slug: "acme".to_string(),
            description: Some("Everything".to_string()),
        };
        let store = app.mediator.send(open.clone()).await.unwrap();
        assert!(store.is_active);
        assert!(app.mediator.send(open).await.is_err());

        app.mediator.send(CloseStore { store_id: store.id }).await.unwrap();
        let active = app
            .mediator
            .send(ListSellerStores {
                seller_id: seller.id,
                include_closed: false,
            })
            .await
            .unwrap();
        assert!(active.is_empty());

        let all = app
            .mediator
            .send(ListSellerStores {
                seller_id: seller.id,
                include_closed: true,
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_list_sellers_by_status() {
        let app = app();
        registered(&app).await;
        approved(&app).await;
        let deleted = approved(&app).await;
        assert!(app
            .mediator
            .send(DeleteSeller { seller_id: deleted.id })
            .await
            .unwrap());

        let result = app
            .mediator
            .send(ListSellers {
                status: Some(SellerStatus::Approved),
                page: None,
            })
            .await
            .unwrap();
        assert_eq!(result.total_count, 1);
        assert!(app
            .mediator
            .send(GetSellerById { seller_id: deleted.id })
            .await
            .unwrap()
            .is_none());
    }
}

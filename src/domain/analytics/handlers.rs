use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::AppContext;
use crate::domain::common::Cents;
use crate::domain::ordering::{Order, OrderStatus};
use crate::error::AppError;
use crate::mediator::{MediatorBuilder, RequestHandler, RequestMeta};
use crate::persistence::{Criteria, Repository};
use super::dto::{ProductSalesDto, SalesSummaryDto, SellerPerformanceDto};
use super::queries::*;

const REPORT_PREFIX: &str = "analytics:";

/// Drop every cached report.
pub async fn invalidate_reports(ctx: &AppContext) {
    ctx.cache.invalidate_prefix(REPORT_PREFIX).await;
}

pub struct AnalyticsHandlers {
    ctx: AppContext,
}

impl AnalyticsHandlers {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

pub fn register(builder: &mut MediatorBuilder, ctx: &AppContext) {
    let handlers = Arc::new(AnalyticsHandlers::new(ctx.clone()));
    builder.register::<GetSalesSummary>(handlers.clone());
    builder.register::<GetSellerPerformance>(handlers);
}

/// Orders are stamped `placed_at` with their creation time, so the window
/// is applied by the store on `created_at`.
async fn orders_placed_between(
    orders: &Repository<Order>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    seller_id: Option<Uuid>,
) -> Result<Vec<Order>, AppError> {
    let mut criteria = Criteria::new().created_between(from, to).oldest_first();
    if let Some(seller_id) = seller_id {
        criteria = criteria.contains("items", serde_json::json!({ "seller_id": seller_id }));
    }
    orders.all(criteria).await
}

fn summarize(
    orders: &[Order],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    top_limit: usize,
) -> SalesSummaryDto {
    let mut delivered_count = 0;
    let mut cancelled_count = 0;
    let mut gross_revenue: Cents = 0;
    let mut products: HashMap<_, ProductSalesDto> = HashMap::new();

    for order in orders {
        match order.status {
            OrderStatus::Cancelled => {
                cancelled_count += 1;
                continue;
            }
            OrderStatus::Delivered => delivered_count += 1,
            _ => {}
        }
        gross_revenue += order.total;

        for item in &order.items {
            let entry = products.entry(item.product_id).or_insert_with(|| ProductSalesDto {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity: 0,
                revenue: 0,
            });
            entry.quantity += i64::from(item.quantity);
            entry.revenue += item.line_total();
        }
    }

    let counted = orders.len() as u64 - cancelled_count;
    let average_order_value = if counted == 0 {
        0
    } else {
        (gross_revenue as f64 / counted as f64).round() as Cents
    };

    let mut top_products: Vec<_> = products.into_values().collect();
    top_products.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then(b.revenue.cmp(&a.revenue))
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    top_products.truncate(top_limit);

    SalesSummaryDto {
        from,
        to,
        order_count: orders.len() as u64,
        delivered_count,
        cancelled_count,
        gross_revenue,
        average_order_value,
        top_products,
    }
}

// ============================================================================
// Queries
// ============================================================================

#[async_trait]
impl RequestHandler<GetSalesSummary> for AnalyticsHandlers {
    async fn handle(&self, request: &GetSalesSummary, _meta: &RequestMeta) -> Result<SalesSummaryDto, AppError> {
        let (from, to) = (request.from, request.to);
        let limit = request.top_products.unwrap_or(DEFAULT_TOP_PRODUCTS);
        let key = format!(
            "{}sales:{}:{}:{}",
            REPORT_PREFIX,
            from.timestamp_millis(),
            to.timestamp_millis(),
            limit
        );
        let orders = self.ctx.data.set::<Order>();

        self.ctx
            .cache
            .get_or_create(&key, None, || async move {
                let placed = orders_placed_between(&orders, from, to, None).await?;
                tracing::debug!(orders = placed.len(), "Computing sales summary");
                Ok::<_, AppError>(summarize(&placed, from, to, limit as usize))
            })
            .await
    }
}

#[async_trait]
impl RequestHandler<GetSellerPerformance> for AnalyticsHandlers {
    async fn handle(&self, request: &GetSellerPerformance, _meta: &RequestMeta) -> Result<SellerPerformanceDto, AppError> {
        let (seller_id, from, to) = (request.seller_id, request.from, request.to);
        let key = format!(
            "{}seller:{}:{}:{}",
            REPORT_PREFIX,
            seller_id,
            from.timestamp_millis(),
            to.timestamp_millis()
        );
        let orders = self.ctx.data.set::<Order>();

        self.ctx
            .cache
            .get_or_create(&key, None, || async move {
                let placed = orders_placed_between(&orders, from, to, Some(seller_id)).await?;

                let mut order_count = 0;
                let mut units_sold = 0;
                let mut revenue: Cents = 0;
                for order in placed.iter().filter(|o| o.status != OrderStatus::Cancelled) {
                    let mut sold_here = false;
                    for item in order.items.iter().filter(|i| i.seller_id == seller_id) {
                        units_sold += i64::from(item.quantity);
                        revenue += item.line_total();
                        sold_here = true;
                    }
                    if sold_here {
                        order_count += 1;
                    }
                }

                Ok::<_, AppError>(SellerPerformanceDto {
                    seller_id,
                    from,
                    to,
                    order_count,
                    units_sold,
                    revenue,
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{app, TestApp};
    use crate::domain::catalog::{CreateCategory, CreateProduct, ProductDto};
    use crate::domain::ordering::{Address, CancelOrder, DeliverOrder, ConfirmOrder, PlaceOrder, PlaceOrderItem, ShipOrder};
    use chrono::Duration;
    use uuid::Uuid;

    async fn seed_product(app: &TestApp, seller_id: Uuid, sku: &str, price: i64) -> ProductDto {
        let category = app
            .mediator
            .send(CreateCategory {
                name: "Reports".to_string(),
                slug: format!("reports-{}", sku.to_lowercase()),
                parent_id: None,
            })
            .await
            .unwrap();
        app.mediator
            .send(CreateProduct {
                seller_id,
                category_id: category.id,
                name: format!("Product {}", sku),
                sku: sku.to_string(),
                description: None,
                price,
                stock_quantity: 100,
            })
            .await
            .unwrap()
    }

    async fn place(app: &TestApp, lines: &[(Uuid, i32)]) -> Uuid {
        app.mediator
            .send(PlaceOrder {
                customer_id: Uuid::new_v4(),
                items: lines
                    .iter()
                    .map(|(product_id, quantity)| PlaceOrderItem {
                        product_id: *product_id,
                        quantity: *quantity,
                    })
                    .collect(),
                shipping_address: Address {
                    street: "1 Main St".to_string(),
                    city: "Springfield".to_string(),
                    postal_code: "12345".to_string(),
                    country: "US".to_string(),
                },
            })
            .await
            .unwrap()
            .id
    }

    fn today() -> GetSalesSummary {
        GetSalesSummary {
            from: Utc::now() - Duration::hours(1),
            to: Utc::now() + Duration::hours(1),
            top_products: None,
        }
    }

    #[tokio::test]
    async fn test_window_must_be_ordered() {
        let app = app();
        let now = Utc::now();
        let err = app
            .mediator
            .send(GetSalesSummary {
                from: now,
                to: now,
                top_products: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_sales_summary_excludes_cancelled_revenue() {
        let app = app();
        let seller = Uuid::new_v4();
        let mug = seed_product(&app, seller, "MUG-1", 1_000).await;
        let tea = seed_product(&app, seller, "TEA-1", 500).await;

        let delivered = place(&app, &[(mug.id, 2), (tea.id, 1)]).await;
        place(&app, &[(tea.id, 4)]).await;
        let cancelled = place(&app, &[(mug.id, 10)]).await;

        app.mediator.send(ConfirmOrder { order_id: delivered }).await.unwrap();
        app.mediator
            .send(ShipOrder {
                order_id: delivered,
                tracking_number: "TRK1".to_string(),
                carrier: "UPS".to_string(),
            })
            .await
            .unwrap();
        app.mediator.send(DeliverOrder { order_id: delivered }).await.unwrap();
        app.mediator
            .send(CancelOrder {
                order_id: cancelled,
                reason: "Changed mind".to_string(),
            })
            .await
            .unwrap();

        let summary = app.mediator.send(today()).await.unwrap();
        assert_eq!(summary.order_count, 3);
        assert_eq!(summary.delivered_count, 1);
        assert_eq!(summary.cancelled_count, 1);
        assert_eq!(summary.gross_revenue, 2_500 + 2_000);
        assert_eq!(summary.average_order_value, 2_250);
        assert_eq!(summary.top_products[0].product_id, tea.id);
        assert_eq!(summary.top_products[0].quantity, 5);
        assert_eq!(summary.top_products[1].quantity, 2);
    }

    #[tokio::test]
    async fn test_order_writes_refresh_cached_reports() {
        let app = app();
        let product = seed_product(&app, Uuid::new_v4(), "CUP-1", 300).await;
        place(&app, &[(product.id, 1)]).await;

        let request = today();
        let before = app.mediator.send(request.clone()).await.unwrap();
        assert_eq!(before.order_count, 1);

        place(&app, &[(product.id, 1)]).await;
        let after = app.mediator.send(request).await.unwrap();
        assert_eq!(after.order_count, 2);
    }

    #[tokio::test]
    async fn test_seller_performance_counts_only_their_lines() {
        let app = app();
        let seller = Uuid::new_v4();
        let ours = seed_product(&app, seller, "OURS-1", 1_200).await;
        let theirs = seed_product(&app, Uuid::new_v4(), "THEIRS-1", 800).await;

        place(&app, &[(ours.id, 2), (theirs.id, 5)]).await;
        place(&app, &[(theirs.id, 1)]).await;

        let performance = app
            .mediator
            .send(GetSellerPerformance {
                seller_id: seller,
                from: Utc::now() - Duration::hours(1),
                to: Utc::now() + Duration::hours(1),
            })
            .await
            .unwrap();
        assert_eq!(performance.order_count, 1);
        assert_eq!(performance.units_sold, 2);
        assert_eq!(performance.revenue, 2_400);
    }
}

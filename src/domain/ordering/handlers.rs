use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::AppContext;
use crate::domain::analytics::invalidate_reports;
use crate::domain::catalog::{invalidate_product, Product};
use crate::domain::common::PagedResult;
use crate::error::AppError;
use crate::mediator::{MediatorBuilder, RequestHandler, RequestMeta};
use crate::persistence::Criteria;
use super::commands::*;
use super::dto::OrderDto;
use super::model::{Order, OrderItem};
use super::queries::*;

// ============================================================================
// Order Handlers
// ============================================================================
//
// PlaceOrder and CancelOrder touch products too: stock is reserved or
// returned in the same unit of work as the order itself, so the order and
// the stock movement commit (and emit their events) together.
//
// ============================================================================

pub struct OrderHandlers {
    ctx: AppContext,
}

impl OrderHandlers {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    async fn load(&self, order_id: Uuid) -> Result<Order, AppError> {
        self.ctx.data.set::<Order>().get(order_id, "Order").await
    }

    async fn save(&self, mut order: Order, meta: &RequestMeta) -> Result<OrderDto, AppError> {
        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.update(&mut order)?;
        uow.save_changes().await?;
        invalidate_reports(&self.ctx).await;
        Ok(OrderDto::from(&order))
    }
}

/// Sum quantities of repeated products, keeping first-seen order.
fn merge_lines(items: &[PlaceOrderItem]) -> Vec<(Uuid, i32)> {
    let mut merged: Vec<(Uuid, i32)> = Vec::with_capacity(items.len());
    for item in items {
        match merged.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, quantity)) => *quantity = quantity.saturating_add(item.quantity),
            None => merged.push((item.product_id, item.quantity)),
        }
    }
    merged
}

pub fn register(builder: &mut MediatorBuilder, ctx: &AppContext) {
    let handlers = Arc::new(OrderHandlers::new(ctx.clone()));
    builder.register::<PlaceOrder>(handlers.clone());
    builder.register::<ConfirmOrder>(handlers.clone());
    builder.register::<ShipOrder>(handlers.clone());
    builder.register::<DeliverOrder>(handlers.clone());
    builder.register::<CancelOrder>(handlers.clone());
    builder.register::<DeleteOrder>(handlers.clone());
    builder.register::<GetOrderById>(handlers.clone());
    builder.register::<ListCustomerOrders>(handlers);
}

// ============================================================================
// Commands
// ============================================================================

#[async_trait]
impl RequestHandler<PlaceOrder> for OrderHandlers {
    async fn handle(&self, request: &PlaceOrder, meta: &RequestMeta) -> Result<OrderDto, AppError> {
        let products = self.ctx.data.set::<Product>();
        let mut uow = self.ctx.data.begin(meta.correlation_id);
        let mut items = Vec::with_capacity(request.items.len());

        for (product_id, quantity) in merge_lines(&request.items) {
            let mut product = products.get(product_id, "Product").await?;
            product.ensure_available(quantity)?;

            items.push(OrderItem::new(
                product.base.id,
                product.seller_id,
                &product.name,
                quantity,
                product.price,
            )?);

            product.adjust_stock(-quantity)?;
            uow.update(&mut product)?;
        }

        let mut order = Order::place(request.customer_id, items, request.shipping_address.clone())?;
        uow.add(&mut order)?;
        uow.save_changes().await?;

        for item in &order.items {
            invalidate_product(&self.ctx, item.product_id).await;
        }
        invalidate_reports(&self.ctx).await;

        tracing::info!(
            order_id = %order.base.id,
            customer_id = %order.customer_id,
            total = order.total,
            items = order.items.len(),
            "Order placed"
        );
        Ok(OrderDto::from(&order))
    }
}

#[async_trait]
impl RequestHandler<ConfirmOrder> for OrderHandlers {
    async fn handle(&self, request: &ConfirmOrder, meta: &RequestMeta) -> Result<OrderDto, AppError> {
        let mut order = self.load(request.order_id).await?;
        order.confirm()?;
        self.save(order, meta).await
    }
}

#[async_trait]
impl RequestHandler<ShipOrder> for OrderHandlers {
    async fn handle(&self, request: &ShipOrder, meta: &RequestMeta) -> Result<OrderDto, AppError> {
        let mut order = self.load(request.order_id).await?;
        order.ship(&request.tracking_number, &request.carrier)?;
        tracing::info!(order_id = %order.base.id, carrier = %request.carrier, "Order shipped");
        self.save(order, meta).await
    }
}

#[async_trait]
impl RequestHandler<DeliverOrder> for OrderHandlers {
    async fn handle(&self, request: &DeliverOrder, meta: &RequestMeta) -> Result<OrderDto, AppError> {
        let mut order = self.load(request.order_id).await?;
        order.deliver()?;
        self.save(order, meta).await
    }
}

#[async_trait]
impl RequestHandler<CancelOrder> for OrderHandlers {
    async fn handle(&self, request: &CancelOrder, meta: &RequestMeta) -> Result<OrderDto, AppError> {
        let mut order = self.load(request.order_id).await?;
        if !order.cancel(&request.reason)? {
            return Ok(OrderDto::from(&order));
        }

        let products = self.ctx.data.set::<Product>();
        let mut uow = self.ctx.data.begin(meta.correlation_id);
        for item in &order.items {
            match products.find(item.product_id).await? {
                Some(mut product) => {
                    product.adjust_stock(item.quantity)?;
                    uow.update(&mut product)?;
                }
                None => {
                    tracing::warn!(
                        order_id = %order.base.id,
                        product_id = %item.product_id,
                        "Product no longer exists; stock not returned"
                    );
                }
            }
        }
        uow.update(&mut order)?;
        uow.save_changes().await?;

        for item in &order.items {
            invalidate_product(&self.ctx, item.product_id).await;
        }
        invalidate_reports(&self.ctx).await;

        tracing::info!(order_id = %order.base.id, reason = %request.reason, "Order cancelled");
        Ok(OrderDto::from(&order))
    }
}

#[async_trait]
impl RequestHandler<DeleteOrder> for OrderHandlers {
    async fn handle(&self, request: &DeleteOrder, meta: &RequestMeta) -> Result<bool, AppError> {
        let Some(mut order) = self.ctx.data.set::<Order>().find(request.order_id).await? else {
            return Ok(false);
        };
        if !order.mark_as_deleted() {
            return Ok(false);
        }
        self.save(order, meta).await?;
        Ok(true)
    }
}

// ============================================================================
// Queries
// ============================================================================

#[async_trait]
impl RequestHandler<GetOrderById> for OrderHandlers {
    async fn handle(&self, request: &GetOrderById, _meta: &RequestMeta) -> Result<Option<OrderDto>, AppError> {
        let order = self.ctx.data.set::<Order>().find(request.order_id).await?;
        Ok(order.as_ref().map(OrderDto::from))
    }
}

#[async_trait]
impl RequestHandler<ListCustomerOrders> for OrderHandlers {
    async fn handle(&self, request: &ListCustomerOrders, _meta: &RequestMeta) -> Result<PagedResult<OrderDto>, AppError> {
        let page = self.ctx.settings.page(request.page);
        let criteria = Criteria::new()
            .eq("customer_id", request.customer_id)
            .eq_opt("status", request.status)
            .newest_first();

        let orders = self.ctx.data.set::<Order>().paged(criteria, page).await?;
        Ok(orders.map(|o| OrderDto::from(&o)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{app, TestApp};
    use crate::domain::catalog::{CreateCategory, CreateProduct, GetProductById, ProductDto};
    use crate::domain::common::PageRequest;
    use crate::domain::ordering::{Address, OrderStatus};

    fn address() -> Address {
        Address {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "US".to_string(),
        }
    }

    async fn seed_product(app: &TestApp, sku: &str, price: i64, stock: i32) -> ProductDto {
        let category = app
            .mediator
            .send(CreateCategory {
                name: "General".to_string(),
                slug: format!("general-{}", sku.to_lowercase()),
                parent_id: None,
            })
            .await
            .unwrap();

        app.mediator
            .send(CreateProduct {
                seller_id: Uuid::new_v4(),
                category_id: category.id,
                name: format!("Product {}", sku),
                sku: sku.to_string(),
                description: None,
                price,
                stock_quantity: stock,
            })
            .await
            .unwrap()
    }

    fn place(customer_id: Uuid, lines: &[(Uuid, i32)]) -> PlaceOrder {
        PlaceOrder {
            customer_id,
            items: lines
                .iter()
                .map(|(product_id, quantity)| PlaceOrderItem {
                    product_id: *product_id,
                    quantity: *quantity,
                })
                .collect(),
            shipping_address: address(),
        }
    }

    async fn stock_of(app: &TestApp, product_id: Uuid) -> i32 {
        app.mediator
            .send(GetProductById { product_id })
            .await
            .unwrap()
            .unwrap()
            .stock_quantity
    }

    #[tokio::test]
    async fn test_place_order_reserves_stock_atomically() {
        let app = app();
        let lamp = seed_product(&app, "LAMP", 1_500, 5).await;
        let bulb = seed_product(&app, "BULB", 200, 10).await;

        let order = app
            .mediator
            .send(place(Uuid::new_v4(), &[(lamp.id, 2), (bulb.id, 3), (lamp.id, 1)]))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.total, 3 * 1_500 + 3 * 200);
        assert_eq!(stock_of(&app, lamp.id).await, 2);
        assert_eq!(stock_of(&app, bulb.id).await, 7);

        let events = app.outbox_event_types().await;
        assert_eq!(
            &events[events.len() - 3..],
            &["StockAdjusted", "StockAdjusted", "OrderPlaced"]
        );
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let app = app();
        let lamp = seed_product(&app, "LAMP", 1_500, 5).await;
        let bulb = seed_product(&app, "BULB", 200, 1).await;
        let before = app.outbox_event_types().await.len();

        let err = app
            .mediator
            .send(place(Uuid::new_v4(), &[(lamp.id, 2), (bulb.id, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BusinessRule(msg) if msg.contains("Insufficient stock")));
        assert_eq!(stock_of(&app, lamp.id).await, 5);
        assert_eq!(app.outbox_event_types().await.len(), before);
        assert_eq!(app.store.entity_count("order").await, 0);
    }

    #[tokio::test]
    async fn test_order_total_overflow_is_a_validation_error() {
        let app = app();
        let yacht = seed_product(&app, "YACHT", i64::MAX / 2, 5).await;

        let err = app
            .mediator
            .send(place(Uuid::new_v4(), &[(yacht.id, 3)]))
            .await
            .unwrap_err();

        match err {
            AppError::Validation(errors) => assert!(errors.has_field("items")),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(stock_of(&app, yacht.id).await, 5);
        assert_eq!(app.store.entity_count("order").await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_orders_for_one_product_all_commit() {
        let app = app();
        let lamp = seed_product(&app, "LAMP", 1_000, 4).await;

        let orders = (0..4).map(|_| app.mediator.send(place(Uuid::new_v4(), &[(lamp.id, 1)])));
        let results = futures_util::future::join_all(orders).await;

        assert!(results.iter().all(Result::is_ok));
        assert_eq!(stock_of(&app, lamp.id).await, 0);
        assert_eq!(app.store.entity_count("order").await, 4);
    }

    #[tokio::test]
    async fn test_lifecycle_and_idempotent_confirm() {
        let app = app();
        let lamp = seed_product(&app, "LAMP", 1_000, 5).await;
        let order = app
            .mediator
            .send(place(Uuid::new_v4(), &[(lamp.id, 1)]))
            .await
            .unwrap();

        app.mediator.send(ConfirmOrder { order_id: order.id }).await.unwrap();
        app.mediator.send(ConfirmOrder { order_id: order.id }).await.unwrap();
        app.mediator
            .send(ShipOrder {
                order_id: order.id,
                tracking_number: "1Z999".to_string(),
                carrier: "UPS".to_string(),
            })
            .await
            .unwrap();
        let delivered = app.mediator.send(DeliverOrder { order_id: order.id }).await.unwrap();

        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.tracking_number.as_deref(), Some("1Z999"));

        let events = app.outbox_event_types().await;
        assert_eq!(events.iter().filter(|e| *e == "OrderConfirmed").count(), 1);
    }

    #[tokio::test]
    async fn test_ship_before_confirm_is_rejected() {
        let app = app();
        let lamp = seed_product(&app, "LAMP", 1_000, 5).await;
        let order = app.mediator.send(place(Uuid::new_v4(), &[(lamp.id, 1)])).await.unwrap();

        let err = app
            .mediator
            .send(ShipOrder {
                order_id: order.id,
                tracking_number: "T".to_string(),
                carrier: "C".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Order must be confirmed before shipping");
    }

    #[tokio::test]
    async fn test_cancel_returns_stock_once() {
        let app = app();
        let lamp = seed_product(&app, "LAMP", 1_000, 5).await;
        let order = app.mediator.send(place(Uuid::new_v4(), &[(lamp.id, 3)])).await.unwrap();
        assert_eq!(stock_of(&app, lamp.id).await, 2);

        let cancel = CancelOrder {
            order_id: order.id,
            reason: "Customer request".to_string(),
        };
        let cancelled = app.mediator.send(cancel.clone()).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(stock_of(&app, lamp.id).await, 5);

        app.mediator.send(cancel).await.unwrap();
        assert_eq!(stock_of(&app, lamp.id).await, 5);
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let app = app();
        let err = app
            .mediator
            .send(ConfirmOrder { order_id: Uuid::new_v4() })
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let none = app
            .mediator
            .send(GetOrderById { order_id: Uuid::new_v4() })
            .await
            .unwrap();
        assert!(none.is_none());
        assert!(!app
            .mediator
            .send(DeleteOrder { order_id: Uuid::new_v4() })
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_list_customer_orders_excludes_deleted() {
        let app = app();
        let lamp = seed_product(&app, "LAMP", 1_000, 10).await;
        let customer = Uuid::new_v4();

        let mut ids = Vec::new();
        for _ in 0..3 {
            let order = app.mediator.send(place(customer, &[(lamp.id, 1)])).await.unwrap();
            ids.push(order.id);
        }
        app.mediator.send(place(Uuid::new_v4(), &[(lamp.id, 1)])).await.unwrap();
        assert!(app.mediator.send(DeleteOrder { order_id: ids[0] }).await.unwrap());

        let orders = app
            .mediator
            .send(ListCustomerOrders {
                customer_id: customer,
                status: Some(OrderStatus::Pending),
                page: Some(PageRequest::new(1, 10)),
            })
            .await
            .unwrap();

        assert_eq!(orders.total_count, 2);
        assert!(orders.items.iter().all(|o| o.id != ids[0]));
    }

    #[test]
    fn test_merge_lines() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let merged = merge_lines(&[
            PlaceOrderItem { product_id: a, quantity: 1 },
            PlaceOrderItem { product_id: b, quantity: 2 },
            PlaceOrderItem { product_id: a, quantity: 3 },
        ]);
        assert_eq!(merged, vec![(a, 4), (b, 2)]);
    }
}

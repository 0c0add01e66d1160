use std::sync::Arc;
use std::time::Duration;

use commerce_cqrs::actors::{Coordinator, CoordinatorConfig, OutboxRelayConfig};
use commerce_cqrs::application::{build_mediator, AppContext, AppSettings};
use commerce_cqrs::cache::CacheService;
use commerce_cqrs::domain::catalog::{CreateCategory, CreateProduct, GetProductById};
use commerce_cqrs::domain::marketplace::{ApproveSeller, RegisterSeller, SellerStatus};
use commerce_cqrs::domain::ordering::{Address, CancelOrder, OrderStatus, PlaceOrder, PlaceOrderItem};
use commerce_cqrs::messaging::RecordingPublisher;
use commerce_cqrs::persistence::InMemoryStore;
use commerce_cqrs::utils::RetryConfig;
use commerce_cqrs::AppError;
use uuid::Uuid;

fn relay_on_demand() -> CoordinatorConfig {
    CoordinatorConfig {
        relay: OutboxRelayConfig {
            poll_interval: Duration::from_secs(3600),
            batch_size: 100,
            max_attempts: 3,
            publish_retry: RetryConfig::conservative(),
        },
        probe_interval: Duration::from_secs(3600),
    }
}

fn address() -> Address {
    Address {
        street: "742 Evergreen Terrace".to_string(),
        city: "Springfield".to_string(),
        postal_code: "49007".to_string(),
        country: "US".to_string(),
    }
}

#[tokio::test]
async fn test_seller_to_cancelled_order_reaches_the_publisher() {
    let store = Arc::new(InMemoryStore::new());
    let publisher = Arc::new(RecordingPublisher::new());
    let ctx = AppContext::new(
        store.clone(),
        CacheService::in_memory(Duration::from_secs(60)),
        AppSettings::default(),
    );
    let mediator = build_mediator(&ctx, None).unwrap();
    let coordinator = Coordinator::start(store.clone(), publisher.clone(), None, Vec::new(), relay_on_demand()).await;

    let seller = mediator
        .send(RegisterSeller {
            owner_user_id: Uuid::new_v4(),
            business_name: "Acme Goods".to_string(),
            contact_email: "sales@acme.test".to_string(),
        })
        .await
        .unwrap();
    let seller = mediator
        .send(ApproveSeller {
            seller_id: seller.id,
            commission_rate: 12.5,
        })
        .await
        .unwrap();
    assert_eq!(seller.status, SellerStatus::Approved);

    let category = mediator
        .send(CreateCategory {
            name: "Kitchen".to_string(),
            slug: "kitchen".to_string(),
            parent_id: None,
        })
        .await
        .unwrap();
    let product = mediator
        .send(CreateProduct {
            seller_id: seller.id,
            category_id: category.id,
            name: "Kettle".to_string(),
            sku: "KET-1".to_string(),
            description: Some("1.7 litre".to_string()),
            price: 3_999,
            stock_quantity: 5,
        })
        .await
        .unwrap();

    let order = mediator
        .send(PlaceOrder {
            customer_id: Uuid::new_v4(),
            items: vec![PlaceOrderItem {
                product_id: product.id,
                quantity: 3,
            }],
            shipping_address: address(),
        })
        .await
        .unwrap();
    assert_eq!(order.total, 3 * 3_999);

    let stocked = mediator
        .send(GetProductById { product_id: product.id })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stocked.stock_quantity, 2);

    let err = mediator
        .send(PlaceOrder {
            customer_id: Uuid::new_v4(),
            items: vec![PlaceOrderItem {
                product_id: product.id,
                quantity: 3,
            }],
            shipping_address: address(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BusinessRule(_)));

    let cancelled = mediator
        .send(CancelOrder {
            order_id: order.id,
            reason: "Found a cheaper kettle".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let restocked = mediator
        .send(GetProductById { product_id: product.id })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restocked.stock_quantity, 5);

    let stats = coordinator.drain_outbox().await.unwrap();
    assert_eq!(stats.failed, 0);

    let published = publisher.event_types().await;
    for expected in [
        "SellerRegistered",
        "SellerApproved",
        "CategoryCreated",
        "ProductCreated",
        "OrderPlaced",
        "OrderCancelled",
    ] {
        assert!(published.iter().any(|t| t == expected), "missing {}", expected);
    }

    let envelopes = publisher.published().await;
    let placed = envelopes
        .iter()
        .find(|e| e.event_type == "OrderPlaced")
        .unwrap();
    assert_eq!(placed.aggregate_id, order.id);

    coordinator.shutdown().await;
}

#[tokio::test]
async fn test_invalid_requests_never_reach_handlers() {
    let store = Arc::new(InMemoryStore::new());
    let ctx = AppContext::new(
        store.clone(),
        CacheService::in_memory(Duration::from_secs(60)),
        AppSettings::default(),
    );
    let mediator = build_mediator(&ctx, None).unwrap();

    let err = mediator
        .send(RegisterSeller {
            owner_user_id: Uuid::nil(),
            business_name: " ".to_string(),
            contact_email: "not-an-email".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        AppError::Validation(errors) => assert!(errors.len() >= 3),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(store.entity_count("seller").await, 0);
    assert!(store.outbox_messages().await.is_empty());
}

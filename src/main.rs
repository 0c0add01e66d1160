use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use commerce_cqrs::actors::{CacheProbe, Coordinator, HealthProbe, StoreProbe};
use commerce_cqrs::application::{build_mediator, AppContext};
use commerce_cqrs::cache::{CacheService, RedisCache};
use commerce_cqrs::config::Config;
use commerce_cqrs::domain::catalog::{CreateCategory, CreateProduct};
use commerce_cqrs::domain::ordering::{Address, ConfirmOrder, PlaceOrder, PlaceOrderItem};
use commerce_cqrs::mediator::Mediator;
use commerce_cqrs::messaging::{EventPublisher, LoggingPublisher, RedpandaClient};
use commerce_cqrs::metrics::{self, HealthReport, Metrics};
use commerce_cqrs::persistence::{EntityStore, InMemoryStore, OutboxStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    // RUST_LOG wins over --log-level.
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .init();

    tracing::info!("Starting commerce_cqrs");

    // === 1. Store ===
    let mut probes: Vec<Arc<dyn HealthProbe>> = Vec::new();
    let (entities, outbox): (Arc<dyn EntityStore>, Arc<dyn OutboxStore>) = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to PostgreSQL");
            let store = Arc::new(PgStore::connect(url, config.database_max_connections).await?);
            store.ensure_schema().await?;
            probes.push(Arc::new(StoreProbe(store.clone())));
            (store.clone(), store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            let store = Arc::new(InMemoryStore::new());
            (store.clone(), store)
        }
    };

    // === 2. Cache ===
    let settings = config.app_settings();
    let (cache, sweeper) = match &config.redis_url {
        Some(url) => {
            let redis = RedisCache::connect(url, &config.cache_namespace).await?;
            (CacheService::new(Arc::new(redis), settings.cache_ttl), None)
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-memory cache");
            let cache = CacheService::in_memory(settings.cache_ttl);
            let sweeper = cache.spawn_sweeper(config.cache_sweep_interval());
            (cache, Some(sweeper))
        }
    };
    probes.push(Arc::new(CacheProbe(cache.clone())));

    // === 3. Publisher ===
    let publisher: Arc<dyn EventPublisher> = match &config.kafka_brokers {
        Some(brokers) => Arc::new(RedpandaClient::new(brokers)?),
        None => {
            tracing::warn!("KAFKA_BROKERS not set, events will only be logged");
            Arc::new(LoggingPublisher)
        }
    };

    // === 4. Metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!(count = metrics.registry().gather().len(), "Metrics registry created");

    // === 5. Infrastructure actors ===
    let coordinator = Coordinator::start(
        outbox,
        publisher,
        Some(metrics.clone()),
        probes,
        config.coordinator_config(),
    )
    .await;

    spawn_metrics_server(
        Arc::new(metrics.registry().clone()),
        coordinator.health_report(),
        config.metrics_port,
    );

    // === 6. Mediator ===
    let ctx = AppContext::new(entities, cache, settings);
    let mediator = build_mediator(&ctx, Some(metrics))?;
    tracing::info!("Mediator ready");

    if config.run_demo {
        if let Err(e) = run_demo(&mediator).await {
            tracing::error!(error = %e, "Demo flow failed");
        }
        match coordinator.drain_outbox().await {
            Ok(stats) => tracing::info!(published = stats.published, failed = stats.failed, "Outbox drained"),
            Err(e) => tracing::warn!(error = %e, "Outbox drain failed"),
        }
    }

    tracing::info!("Running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    coordinator.shutdown().await;
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

/// actix-web gets its own runtime thread.
fn spawn_metrics_server(
    registry: Arc<prometheus::Registry>,
    health: Arc<dyn HealthReport>,
    port: u16,
) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!(error = %e, "Could not build metrics runtime");
                return;
            }
        };
        runtime.block_on(async {
            if let Err(e) = metrics::start_metrics_server(registry, Some(health), port).await {
                tracing::error!(error = %e, "Metrics server error");
            }
        });
    });
}

async fn run_demo(mediator: &Mediator) -> anyhow::Result<()> {
    tracing::info!("Running demo order flow");

    let category = mediator
        .send(CreateCategory {
            name: "Demo".to_string(),
            slug: format!("demo-{}", Uuid::new_v4().simple()),
            parent_id: None,
        })
        .await?;

    let product = mediator
        .send(CreateProduct {
            seller_id: Uuid::new_v4(),
            category_id: category.id,
            name: "Demo mug".to_string(),
            sku: format!("DEMO-{}", Uuid::new_v4().simple()),
            description: Some("Placed by the startup demo".to_string()),
            price: 1_299,
            stock_quantity: 10,
        })
        .await?;

    let order = mediator
        .send(PlaceOrder {
            customer_id: Uuid::new_v4(),
            items: vec![PlaceOrderItem {
                product_id: product.id,
                quantity: 2,
            }],
            shipping_address: Address {
                street: "1 Demo Way".to_string(),
                city: "Springfield".to_string(),
                postal_code: "12345".to_string(),
                country: "US".to_string(),
            },
        })
        .await?;
    tracing::info!(order_id = %order.id, total = order.total, "Demo order placed");

    mediator.send(ConfirmOrder { order_id: order.id }).await?;
    tracing::info!(order_id = %order.id, "Demo order confirmed");

    Ok(())
}

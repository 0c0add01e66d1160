use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheService;
use crate::domain;
use crate::domain::common::pagination::{DEFAULT_MAX_PAGE_SIZE, DEFAULT_PAGE_SIZE};
use crate::domain::common::PageRequest;
use crate::mediator::{
    LoggingBehavior, Mediator, MediatorBuildError, MediatorBuilder, MetricsBehavior,
    ValidationBehavior,
};
use crate::metrics::Metrics;
use crate::persistence::{DataContext, EntityStore};
use crate::utils::RetryConfig;

// ============================================================================
// Application Wiring
// ============================================================================
//
// AppContext is what every handler holds: the data context, the cache and
// the runtime settings. build_mediator registers the pipeline behaviors and
// every domain module's handlers.
//
// ============================================================================

/// Runtime settings consumed by handlers.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub cache_ttl: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

impl AppSettings {
    /// Missing page → first page of the default size; always clamped.
    pub fn page(&self, requested: Option<PageRequest>) -> PageRequest {
        requested
            .unwrap_or(PageRequest::new(1, self.default_page_size))
            .clamped(self.max_page_size)
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub data: DataContext,
    pub cache: CacheService,
    pub settings: AppSettings,
}

impl AppContext {
    pub fn new(store: Arc<dyn EntityStore>, cache: CacheService, settings: AppSettings) -> Self {
        Self {
            data: DataContext::new(store),
            cache,
            settings,
        }
    }
}

/// Register every domain module's handlers on a builder.
pub fn register_handlers(builder: &mut MediatorBuilder, ctx: &AppContext) {
    domain::ordering::register(builder, ctx);
    domain::catalog::register(builder, ctx);
    domain::marketplace::register(builder, ctx);
    domain::pricing::register(builder, ctx);
    domain::subscriptions::register(builder, ctx);
    domain::live_commerce::register(builder, ctx);
    domain::notifications::register(builder, ctx);
    domain::content::register(builder, ctx);
    domain::governance::register(builder, ctx);
    domain::analytics::register(builder, ctx);
}

/// Behaviors: logging (outermost), metrics when enabled, then validation, so
/// rejected requests are still logged and counted. Requests marked
/// `retry_on_conflict` retry under `RetryConfig::for_conflicts`.
pub fn build_mediator(
    ctx: &AppContext,
    metrics: Option<Arc<Metrics>>,
) -> Result<Mediator, MediatorBuildError> {
    let mut builder = Mediator::builder()
        .retry_conflicts(RetryConfig::for_conflicts())
        .behavior(LoggingBehavior);
    if let Some(metrics) = metrics {
        builder = builder.behavior(MetricsBehavior::new(metrics));
    }
    let mut builder = builder.behavior(ValidationBehavior);

    register_handlers(&mut builder, ctx);
    builder.build()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryStore;

    #[test]
    fn test_page_defaults_and_clamps() {
        let settings = AppSettings {
            default_page_size: 25,
            max_page_size: 50,
            cache_ttl: Duration::from_secs(60),
        };

        assert_eq!(settings.page(None), PageRequest::new(1, 25));
        assert_eq!(settings.page(Some(PageRequest::new(2, 500))), PageRequest::new(2, 50));
        assert_eq!(settings.page(Some(PageRequest::new(0, 0))), PageRequest::new(1, 1));
    }

    #[test]
    fn test_every_domain_registers_without_duplicates() {
        let ctx = AppContext::new(
            Arc::new(InMemoryStore::new()),
            CacheService::in_memory(Duration::from_secs(60)),
            AppSettings::default(),
        );

        let mediator = build_mediator(&ctx, None).unwrap();
        assert!(mediator.handler_count() > 60);
        assert!(mediator.registered_requests().contains(&"PlaceOrder"));
        assert!(mediator.registered_requests().contains(&"GetSalesSummary"));
    }

    #[tokio::test]
    async fn test_rejected_requests_are_counted() {
        let ctx = AppContext::new(
            Arc::new(InMemoryStore::new()),
            CacheService::in_memory(Duration::from_secs(60)),
            AppSettings::default(),
        );
        let metrics = Arc::new(Metrics::new().unwrap());
        let mediator = build_mediator(&ctx, Some(metrics.clone())).unwrap();

        let err = mediator
            .send(domain::catalog::CreateCategory {
                name: String::new(),
                slug: "Not A Slug".to_string(),
                parent_id: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");

        let rejected = metrics
            .requests_total
            .with_label_values(&["CreateCategory", "command", "validation"])
            .get();
        assert_eq!(rejected, 1);
    }
}

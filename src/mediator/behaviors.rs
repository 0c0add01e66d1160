use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::Instrument;

use crate::error::AppError;
use crate::metrics::Metrics;
use super::pipeline::{ErasedResponse, Next, PipelineBehavior, RequestContext};

// ============================================================================
// Logging Behavior
// ============================================================================

/// Opens a span per request and logs the outcome with elapsed time.
#[derive(Debug, Default)]
pub struct LoggingBehavior;

#[async_trait]
impl PipelineBehavior for LoggingBehavior {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        next: Next<'_>,
    ) -> Result<ErasedResponse, AppError> {
        let span = tracing::info_span!(
            "request",
            request = ctx.meta.name,
            kind = ctx.meta.kind.as_str(),
            correlation_id = %ctx.meta.correlation_id,
        );

        async move {
            let started = Instant::now();
            tracing::debug!("Handling request");

            let result = next.run().await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match &result {
                Ok(_) => {
                    tracing::debug!(elapsed_ms, "Request handled");
                }
                Err(e) if e.is_expected() => {
                    tracing::warn!(elapsed_ms, error = %e, "Request rejected");
                }
                Err(e) => {
                    tracing::error!(elapsed_ms, error = %e, "Request failed");
                }
            }

            result
        }
        .instrument(span)
        .await
    }
}

// ============================================================================
// Validation Behavior
// ============================================================================

/// Runs the request's validator and short-circuits on failure.
#[derive(Debug, Default)]
pub struct ValidationBehavior;

#[async_trait]
impl PipelineBehavior for ValidationBehavior {
    fn name(&self) -> &'static str {
        "validation"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        next: Next<'_>,
    ) -> Result<ErasedResponse, AppError> {
        if let Err(errors) = ctx.request.validate() {
            tracing::debug!(
                request = ctx.meta.name,
                error_count = errors.len(),
                "Request failed validation"
            );
            return Err(AppError::Validation(errors));
        }

        next.run().await
    }
}

// ============================================================================
// Metrics Behavior
// ============================================================================

pub struct MetricsBehavior {
    metrics: Arc<Metrics>,
}

impl MetricsBehavior {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self { metrics }
    }
}

#[async_trait]
impl PipelineBehavior for MetricsBehavior {
    fn name(&self) -> &'static str {
        "metrics"
    }

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        next: Next<'_>,
    ) -> Result<ErasedResponse, AppError> {
        let started = Instant::now();
        let result = next.run().await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        self.metrics.record_request(
            ctx.meta.name,
            ctx.meta.kind.as_str(),
            outcome,
            started.elapsed().as_secs_f64(),
        );

        result
    }
}

use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use async_trait::async_trait;
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;

/// Source of the `/health` payload.
#[async_trait]
pub trait HealthReport: Send + Sync {
    /// `(is_available, body)`; unavailable maps to 503.
    async fn report(&self) -> (bool, serde_json::Value);
}

/// Start the metrics HTTP server.
/// Runs on its own runtime thread so actix does not share the app runtime.
pub async fn start_metrics_server(
    registry: Arc<Registry>,
    health: Option<Arc<dyn HealthReport>>,
    port: u16,
) -> std::io::Result<()> {
    tracing::info!(port, "Starting metrics server on /metrics and /health");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(registry.clone()))
            .app_data(web::Data::new(health.clone()))
            .route("/metrics", web::get().to(metrics_handler))
            .route("/health", web::get().to(health_handler))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

async fn metrics_handler(registry: web::Data<Arc<Registry>>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(health: web::Data<Option<Arc<dyn HealthReport>>>) -> impl Responder {
    match health.get_ref() {
        Some(report) => {
            let (available, body) = report.report().await;
            if available {
                HttpResponse::Ok().json(body)
            } else {
                HttpResponse::ServiceUnavailable().json(body)
            }
        }
        None => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "service": "commerce-cqrs"
        })),
    }
}

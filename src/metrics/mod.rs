mod server;

use prometheus::core::Collector;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};

pub use server::{start_metrics_server, HealthReport};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// - Mediator requests (throughput, outcome, latency)
// - Outbox relay publishing
// - Retry attempts and outcomes
// - Dead letter queue
// - Circuit breaker state
// - Component health
//
// Everything is registered on one registry scraped via /metrics.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Mediator
    pub requests_total: IntCounterVec,
    pub request_duration: HistogramVec,

    // Outbox relay
    pub outbox_published: IntCounterVec,
    pub outbox_failed: IntCounterVec,
    pub outbox_publish_duration: HistogramVec,
    pub outbox_pending: IntGauge,

    // Retry
    pub retry_attempts_total: IntCounterVec,
    pub retry_success: IntCounterVec,
    pub retry_failure: IntCounterVec,

    // DLQ
    pub dlq_messages_total: IntCounter,
    pub dlq_messages_by_event_type: IntCounterVec,

    // Circuit breaker
    pub circuit_breaker_state: IntGauge,

    // Health
    pub system_health_status: IntGauge,
}

/// Register `collector` and hand back a clone for recording.
fn registered<C>(registry: &Registry, collector: C) -> prometheus::Result<C>
where
    C: Collector + Clone + 'static,
{
    registry.register(Box::new(collector.clone()))?;
    Ok(collector)
}

const LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0];

fn counter_vec(name: &str, help: &str, labels: &[&str]) -> prometheus::Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
}

fn latency(name: &str, help: &str, labels: &[&str]) -> prometheus::Result<HistogramVec> {
    HistogramVec::new(HistogramOpts::new(name, help).buckets(LATENCY_BUCKETS.to_vec()), labels)
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let r = Registry::new();

        Ok(Self {
            requests_total: registered(
                &r,
                counter_vec(
                    "mediator_requests_total",
                    "Requests dispatched through the mediator",
                    &["request", "kind", "outcome"],
                )?,
            )?,
            request_duration: registered(
                &r,
                latency("mediator_request_duration_seconds", "Request handling duration", &["request", "kind"])?,
            )?,
            outbox_published: registered(
                &r,
                counter_vec("outbox_messages_published_total", "Outbox messages published", &["event_type"])?,
            )?,
            outbox_failed: registered(
                &r,
                counter_vec("outbox_messages_failed_total", "Outbox publishes that failed", &["event_type"])?,
            )?,
            outbox_publish_duration: registered(
                &r,
                latency("outbox_publish_duration_seconds", "Outbox publish duration", &["event_type"])?,
            )?,
            outbox_pending: registered(
                &r,
                IntGauge::new("outbox_pending_messages", "Unprocessed outbox messages seen by the last poll")?,
            )?,
            retry_attempts_total: registered(
                &r,
                counter_vec("retry_attempts_total", "Attempts beyond the first", &["operation", "attempt"])?,
            )?,
            retry_success: registered(
                &r,
                counter_vec("retry_success_total", "Operations that succeeded after retrying", &["operation"])?,
            )?,
            retry_failure: registered(
                &r,
                counter_vec("retry_failure_total", "Operations that failed on every attempt", &["operation"])?,
            )?,
            dlq_messages_total: registered(
                &r,
                IntCounter::new("dlq_messages_total", "Outbox messages moved to the dead letter queue")?,
            )?,
            dlq_messages_by_event_type: registered(
                &r,
                counter_vec("dlq_messages_by_event_type", "Dead letters by event type", &["event_type"])?,
            )?,
            circuit_breaker_state: registered(
                &r,
                IntGauge::new("circuit_breaker_state", "Broker circuit (0=Closed, 1=Open, 2=HalfOpen)")?,
            )?,
            system_health_status: registered(
                &r,
                IntGauge::new("system_health_status", "Overall health (0=Unhealthy, 1=Degraded, 2=Healthy)")?,
            )?,
            registry: r,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_request(&self, request: &str, kind: &str, outcome: &str, duration_secs: f64) {
        self.requests_total
            .with_label_values(&[request, kind, outcome])
            .inc();
        self.request_duration
            .with_label_values(&[request, kind])
            .observe(duration_secs);
    }

    pub fn record_publish(&self, event_type: &str, duration_secs: f64, success: bool) {
        if success {
            self.outbox_published.with_label_values(&[event_type]).inc();
        } else {
            self.outbox_failed.with_label_values(&[event_type]).inc();
        }
        self.outbox_publish_duration
            .with_label_values(&[event_type])
            .observe(duration_secs);
    }

    pub fn record_retry_attempt(&self, operation: &str, attempt: u32) {
        self.retry_attempts_total
            .with_label_values(&[operation, &attempt.to_string()])
            .inc();
    }

    pub fn record_retry_outcome(&self, operation: &str, success: bool) {
        if success {
            self.retry_success.with_label_values(&[operation]).inc();
        } else {
            self.retry_failure.with_label_values(&[operation]).inc();
        }
    }

    pub fn record_dlq_message(&self, event_type: &str) {
        self.dlq_messages_total.inc();
        self.dlq_messages_by_event_type
            .with_label_values(&[event_type])
            .inc();
    }

    pub fn update_circuit_breaker_state(&self, state: i64) {
        self.circuit_breaker_state.set(state);
    }

    pub fn update_system_health(&self, status: i64) {
        self.system_health_status.set(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_value(metrics: &Metrics, name: &str) -> Option<f64> {
        metrics
            .registry
            .gather()
            .iter()
            .find(|m| m.name() == name)
            .and_then(|m| m.metric.first().and_then(|s| s.counter.value))
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.update_system_health(2);
        assert!(!metrics.registry.gather().is_empty());
    }

    #[test]
    fn test_record_request() {
        let metrics = Metrics::new().unwrap();
        metrics.record_request("PlaceOrder", "command", "success", 0.02);
        metrics.record_request("PlaceOrder", "command", "success", 0.03);

        assert_eq!(counter_value(&metrics, "mediator_requests_total"), Some(2.0));
    }

    #[test]
    fn test_record_publish() {
        let metrics = Metrics::new().unwrap();
        metrics.record_publish("OrderPlaced", 0.05, true);

        assert_eq!(counter_value(&metrics, "outbox_messages_published_total"), Some(1.0));
    }

    #[test]
    fn test_record_retry() {
        let metrics = Metrics::new().unwrap();
        metrics.record_retry_attempt("outbox_publish", 1);
        metrics.record_retry_attempt("outbox_publish", 2);
        metrics.record_retry_outcome("outbox_publish", true);

        let gathered = metrics.registry.gather();
        let attempts = gathered.iter().find(|m| m.name() == "retry_attempts_total").unwrap();
        assert_eq!(attempts.metric.len(), 2);
    }

    #[test]
    fn test_record_dlq_message() {
        let metrics = Metrics::new().unwrap();
        metrics.record_dlq_message("OrderPlaced");
        metrics.record_dlq_message("ProductCreated");

        assert_eq!(counter_value(&metrics, "dlq_messages_total"), Some(2.0));
    }

    #[test]
    fn test_circuit_breaker_gauge() {
        let metrics = Metrics::new().unwrap();
        metrics.update_circuit_breaker_state(1);

        let gathered = metrics.registry.gather();
        let state = gathered.iter().find(|m| m.name() == "circuit_breaker_state").unwrap();
        assert_eq!(state.metric[0].gauge.value, Some(1.0));
    }
}

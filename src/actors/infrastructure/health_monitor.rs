use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use kameo::{Actor, Reply};
use serde::Serialize;

use crate::actors::core::{ComponentHealth, HealthProbe, HealthStatus};
use crate::cache::CacheService;
use crate::messaging::EventPublisher;
use crate::metrics::{HealthReport, Metrics};
use crate::persistence::PgStore;
use crate::utils::CircuitState;

// ============================================================================
// Health Monitor Actor - aggregates component health
// ============================================================================
//
// - Probes (store, cache, broker) are polled on an interval
// - Other actors push `UpdateHealth` directly
// - Overall status: any Unhealthy → Unhealthy, any Degraded → Degraded
//
// ============================================================================

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone)]
pub struct UpdateHealth {
    pub component: String,
    pub status: HealthStatus,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct GetSystemHealth;

/// Runs every probe immediately.
#[derive(Debug, Clone, Copy)]
pub struct RunProbes;

#[derive(Debug, Clone, Serialize, Reply)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: HashMap<String, ComponentHealth>,
    pub check_time: DateTime<Utc>,
}

// ============================================================================
// Health Monitor Actor
// ============================================================================

pub struct HealthMonitorActor {
    components: HashMap<String, ComponentHealth>,
    probes: Vec<Arc<dyn HealthProbe>>,
    probe_interval: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl HealthMonitorActor {
    pub fn new(probe_interval: Duration) -> Self {
        Self {
            components: HashMap::new(),
            probes: Vec::new(),
            probe_interval,
            metrics: None,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn compute_overall_status(&self) -> HealthStatus {
        let mut degraded = Vec::new();
        let mut unhealthy = Vec::new();

        for (name, health) in &self.components {
            match &health.status {
                HealthStatus::Unhealthy(msg) => unhealthy.push(format!("{}: {}", name, msg)),
                HealthStatus::Degraded(msg) => degraded.push(format!("{}: {}", name, msg)),
                HealthStatus::Healthy => {}
            }
        }
        unhealthy.sort();
        degraded.sort();

        if !unhealthy.is_empty() {
            HealthStatus::Unhealthy(unhealthy.join(", "))
        } else if !degraded.is_empty() {
            HealthStatus::Degraded(degraded.join(", "))
        } else {
            HealthStatus::Healthy
        }
    }

    fn record(&mut self, component: String, status: HealthStatus, details: Option<String>) {
        if let Some(previous) = self.components.get(&component) {
            if previous.status != status {
                tracing::info!(
                    component = %component,
                    from = ?previous.status,
                    to = ?status,
                    "Component health changed"
                );
            }
        }

        let mut health = ComponentHealth::new(component.clone(), status);
        health.details = details;
        self.components.insert(component, health);

        if let Some(metrics) = &self.metrics {
            metrics.update_system_health(self.compute_overall_status().as_gauge());
        }
    }

    async fn run_probes(&mut self) {
        let probes = self.probes.clone();
        for probe in probes {
            let status = probe.check().await;
            self.record(probe.component().to_string(), status, None);
        }
    }
}

impl Actor for HealthMonitorActor {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(state: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!(probes = state.probes.len(), "HealthMonitorActor started");

        let interval = state.probe_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if actor_ref.tell(RunProbes).send().await.is_err() {
                    break;
                }
            }
        });

        Ok(state)
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<UpdateHealth> for HealthMonitorActor {
    type Reply = ();

    async fn handle(&mut self, msg: UpdateHealth, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        tracing::debug!(component = %msg.component, status = ?msg.status, "Updated component health");
        self.record(msg.component, msg.status, msg.details);
    }
}

impl Message<RunProbes> for HealthMonitorActor {
    type Reply = ();

    async fn handle(&mut self, _msg: RunProbes, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        self.run_probes().await;
    }
}

impl Message<GetSystemHealth> for HealthMonitorActor {
    type Reply = SystemHealth;

    async fn handle(&mut self, _msg: GetSystemHealth, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        SystemHealth {
            overall_status: self.compute_overall_status(),
            components: self.components.clone(),
            check_time: Utc::now(),
        }
    }
}

// ============================================================================
// Probes
// ============================================================================

/// Broker health from the publisher's circuit breaker.
pub struct PublisherProbe {
    publisher: Arc<dyn EventPublisher>,
    metrics: Option<Arc<Metrics>>,
}

impl PublisherProbe {
    pub fn new(publisher: Arc<dyn EventPublisher>, metrics: Option<Arc<Metrics>>) -> Self {
        Self { publisher, metrics }
    }
}

#[async_trait]
impl HealthProbe for PublisherProbe {
    fn component(&self) -> &'static str {
        "publisher"
    }

    async fn check(&self) -> HealthStatus {
        let Some(state) = self.publisher.circuit_state().await else {
            return HealthStatus::Healthy;
        };
        if let Some(metrics) = &self.metrics {
            metrics.update_circuit_breaker_state(state.as_gauge());
        }
        match state {
            CircuitState::Closed => HealthStatus::Healthy,
            CircuitState::HalfOpen => HealthStatus::Degraded("Circuit breaker half-open".to_string()),
            CircuitState::Open => HealthStatus::Unhealthy("Circuit breaker open".to_string()),
        }
    }
}

pub struct CacheProbe(pub CacheService);

#[async_trait]
impl HealthProbe for CacheProbe {
    fn component(&self) -> &'static str {
        "cache"
    }

    async fn check(&self) -> HealthStatus {
        // Requests still succeed without the cache, only slower.
        if self.0.is_healthy().await {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded(format!("{} cache unreachable", self.0.backend_name()))
        }
    }
}

pub struct StoreProbe(pub Arc<PgStore>);

#[async_trait]
impl HealthProbe for StoreProbe {
    fn component(&self) -> &'static str {
        "store"
    }

    async fn check(&self) -> HealthStatus {
        match self.0.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        }
    }
}

#[async_trait]
impl HealthReport for ActorRef<HealthMonitorActor> {
    async fn report(&self) -> (bool, serde_json::Value) {
        match self.ask(GetSystemHealth).await {
            Ok(health) => {
                let available = !health.overall_status.is_unhealthy();
                let body = serde_json::to_value(&health)
                    .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }));
                (available, body)
            }
            Err(e) => (
                false,
                serde_json::json!({ "status": "unhealthy", "reason": e.to_string() }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kameo::prelude::*;

    struct FixedProbe(HealthStatus);

    #[async_trait]
    impl HealthProbe for FixedProbe {
        fn component(&self) -> &'static str {
            "fixed"
        }

        async fn check(&self) -> HealthStatus {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_overall_status_takes_worst_component() {
        let monitor = HealthMonitorActor::spawn(HealthMonitorActor::new(Duration::from_secs(3600)));

        monitor
            .tell(UpdateHealth {
                component: "store".to_string(),
                status: HealthStatus::Healthy,
                details: None,
            })
            .send()
            .await
            .unwrap();
        let health = monitor.ask(GetSystemHealth).await.unwrap();
        assert!(health.overall_status.is_healthy());

        monitor
            .tell(UpdateHealth {
                component: "cache".to_string(),
                status: HealthStatus::Degraded("slow".to_string()),
                details: None,
            })
            .send()
            .await
            .unwrap();
        let health = monitor.ask(GetSystemHealth).await.unwrap();
        assert!(health.overall_status.is_degraded());
        assert_eq!(health.components.len(), 2);
    }

    #[tokio::test]
    async fn test_probes_feed_component_health() {
        let monitor = HealthMonitorActor::new(Duration::from_secs(3600))
            .with_probe(Arc::new(FixedProbe(HealthStatus::Unhealthy("down".to_string()))));
        let monitor = HealthMonitorActor::spawn(monitor);

        monitor.ask(RunProbes).await.unwrap();
        let health = monitor.ask(GetSystemHealth).await.unwrap();
        assert_eq!(
            health.overall_status,
            HealthStatus::Unhealthy("fixed: down".to_string())
        );

        let (available, body) = monitor.report().await;
        assert!(!available);
        assert_eq!(body["overall_status"]["status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_cache_probe_reports_memory_cache_healthy() {
        let probe = CacheProbe(CacheService::in_memory(Duration::from_secs(60)));
        assert!(probe.check().await.is_healthy());
    }
}

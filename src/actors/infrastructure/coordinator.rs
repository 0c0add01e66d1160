use std::sync::Arc;
use std::time::Duration;

use kameo::actor::ActorRef;
use kameo::prelude::*;

use crate::actors::core::{HealthProbe, HealthStatus};
use crate::messaging::EventPublisher;
use crate::metrics::{HealthReport, Metrics};
use crate::persistence::{DeadLetter, OutboxStore};
use super::dlq::{DlqActor, DlqStats, GetDlqMessages, GetDlqStats};
use super::health_monitor::{
    GetSystemHealth, HealthMonitorActor, PublisherProbe, SystemHealth, UpdateHealth,
};
use super::outbox_relay::{DrainOutbox, OutboxRelay, OutboxRelayConfig, RelayStats};

// ============================================================================
// Coordinator - owns the infrastructure actors
// ============================================================================
//
// Actor Hierarchy:
//   Coordinator
//   ├── HealthMonitorActor
//   ├── DlqActor
//   └── OutboxRelay  (→ DlqActor, → HealthMonitorActor)
//
// ============================================================================

pub struct CoordinatorConfig {
    pub relay: OutboxRelayConfig,
    pub probe_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            relay: OutboxRelayConfig::default(),
            probe_interval: Duration::from_secs(10),
        }
    }
}

pub struct Coordinator {
    health_monitor: ActorRef<HealthMonitorActor>,
    dlq: ActorRef<DlqActor>,
    relay: ActorRef<OutboxRelay>,
}

impl Coordinator {
    /// Spawn every infrastructure actor. Must run inside a tokio runtime.
    pub async fn start(
        outbox: Arc<dyn OutboxStore>,
        publisher: Arc<dyn EventPublisher>,
        metrics: Option<Arc<Metrics>>,
        extra_probes: Vec<Arc<dyn HealthProbe>>,
        config: CoordinatorConfig,
    ) -> Self {
        tracing::info!(publisher = publisher.name(), "Starting infrastructure actors");

        let mut monitor = HealthMonitorActor::new(config.probe_interval)
            .with_probe(Arc::new(PublisherProbe::new(publisher.clone(), metrics.clone())));
        for probe in extra_probes {
            monitor = monitor.with_probe(probe);
        }
        if let Some(m) = &metrics {
            monitor = monitor.with_metrics(m.clone());
        }
        let health_monitor = HealthMonitorActor::spawn(monitor);

        let dlq = DlqActor::spawn(DlqActor::new(outbox.clone(), metrics.clone()));
        Self::report(&health_monitor, "dlq", "DLQ actor started").await;

        let mut relay = OutboxRelay::new(outbox, publisher, config.relay)
            .with_dlq(dlq.clone())
            .with_health_monitor(health_monitor.clone());
        if let Some(m) = metrics {
            relay = relay.with_metrics(m);
        }
        let relay = OutboxRelay::spawn(relay);
        Self::report(&health_monitor, "outbox_relay", "Outbox relay started").await;

        tracing::info!("All infrastructure actors started");
        Self {
            health_monitor,
            dlq,
            relay,
        }
    }

    async fn report(monitor: &ActorRef<HealthMonitorActor>, component: &str, details: &str) {
        let update = UpdateHealth {
            component: component.to_string(),
            status: HealthStatus::Healthy,
            details: Some(details.to_string()),
        };
        if let Err(e) = monitor.tell(update).send().await {
            tracing::warn!(component = %component, error = %e, "Could not report health");
        }
    }

    /// Publish one batch immediately instead of waiting for the next poll.
    pub async fn drain_outbox(&self) -> anyhow::Result<RelayStats> {
        self.relay
            .ask(DrainOutbox)
            .await
            .map_err(|e| anyhow::anyhow!("Outbox drain failed: {}", e))
    }

    pub async fn system_health(&self) -> anyhow::Result<SystemHealth> {
        self.health_monitor
            .ask(GetSystemHealth)
            .await
            .map_err(|e| anyhow::anyhow!("Health monitor unavailable: {}", e))
    }

    pub async fn dead_letters(&self, limit: i64) -> anyhow::Result<Vec<DeadLetter>> {
        self.dlq
            .ask(GetDlqMessages { limit })
            .await
            .map_err(|e| anyhow::anyhow!("DLQ query failed: {}", e))
    }

    pub async fn dlq_stats(&self) -> anyhow::Result<DlqStats> {
        self.dlq
            .ask(GetDlqStats)
            .await
            .map_err(|e| anyhow::anyhow!("DLQ stats failed: {}", e))
    }

    pub fn health_report(&self) -> Arc<dyn HealthReport> {
        Arc::new(self.health_monitor.clone())
    }

    /// Stop the relay first so nothing new reaches the DLQ, then the rest.
    pub async fn shutdown(self) {
        tracing::info!("Stopping infrastructure actors");
        if let Err(e) = self.relay.stop_gracefully().await {
            tracing::warn!(error = %e, "Outbox relay did not stop cleanly");
        }
        if let Err(e) = self.dlq.stop_gracefully().await {
            tracing::warn!(error = %e, "DLQ actor did not stop cleanly");
        }
        if let Err(e) = self.health_monitor.stop_gracefully().await {
            tracing::warn!(error = %e, "Health monitor did not stop cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::RecordingPublisher;
    use crate::persistence::{ChangeSet, EntityStore, InMemoryStore, OutboxMessage};
    use crate::utils::RetryConfig;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_coordinator_relays_and_reports_health() {
        let store = Arc::new(InMemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        store
            .commit(ChangeSet {
                entities: Vec::new(),
                outbox: vec![OutboxMessage::new(
                    "product",
                    "catalog-events",
                    Uuid::new_v4(),
                    "ProductCreated",
                    serde_json::json!({}),
                    Uuid::new_v4(),
                )],
            })
            .await
            .unwrap();

        let config = CoordinatorConfig {
            relay: OutboxRelayConfig {
                poll_interval: Duration::from_secs(3600),
                batch_size: 10,
                max_attempts: 3,
                publish_retry: RetryConfig::conservative(),
            },
            probe_interval: Duration::from_secs(3600),
        };
        let coordinator = Coordinator::start(store.clone(), publisher.clone(), None, Vec::new(), config).await;

        coordinator.drain_outbox().await.unwrap();
        assert_eq!(publisher.event_types().await, vec!["ProductCreated"]);

        let health = coordinator.system_health().await.unwrap();
        assert!(health.components.contains_key("dlq"));
        assert!(health.components.contains_key("outbox_relay"));
        assert!(!health.overall_status.is_unhealthy());

        assert_eq!(coordinator.dlq_stats().await.unwrap().total_messages, 0);
        coordinator.shutdown().await;
    }
}

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use kameo::{Actor, Reply};
use uuid::Uuid;

use crate::actors::core::HealthStatus;
use crate::messaging::EventPublisher;
use crate::metrics::Metrics;
use crate::persistence::{OutboxMessage, OutboxStore, StoreError};
use crate::utils::{retry_with_backoff, RetryConfig};
use super::dlq::{AddToDlq, DlqActor};
use super::health_monitor::{HealthMonitorActor, UpdateHealth};

// ============================================================================
// Outbox Relay Actor - polls the outbox and publishes domain events
// ============================================================================
//
// Each poll:
// 1. load up to `batch_size` unprocessed messages, oldest first
// 2. publish each one with exponential backoff
// 3. success → mark processed
// 4. failure → record the attempt; after `max_attempts` hand it to the DLQ
//
// Once a message of an aggregate fails, later messages of the same aggregate
// in that batch are held back so per-aggregate order is preserved.
//
// Polls are messages to the actor itself, so batches never overlap.
//
// ============================================================================

const COMPONENT: &str = "outbox_relay";

#[derive(Debug, Clone)]
pub struct OutboxRelayConfig {
    pub poll_interval: Duration,
    pub batch_size: i64,
    /// Failed polls before a message goes to the DLQ
    pub max_attempts: i32,
    /// Backoff within a single poll
    pub publish_retry: RetryConfig,
}

impl Default for OutboxRelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            batch_size: 100,
            max_attempts: 5,
            publish_retry: RetryConfig::conservative(),
        }
    }
}

pub struct OutboxRelay {
    store: Arc<dyn OutboxStore>,
    publisher: Arc<dyn EventPublisher>,
    dlq: Option<ActorRef<DlqActor>>,
    health: Option<ActorRef<HealthMonitorActor>>,
    metrics: Option<Arc<Metrics>>,
    config: OutboxRelayConfig,
    first_failures: HashMap<Uuid, DateTime<Utc>>,
    totals: RelayStats,
}

impl OutboxRelay {
    pub fn new(
        store: Arc<dyn OutboxStore>,
        publisher: Arc<dyn EventPublisher>,
        config: OutboxRelayConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            dlq: None,
            health: None,
            metrics: None,
            config,
            first_failures: HashMap::new(),
            totals: RelayStats::default(),
        }
    }

    pub fn with_dlq(mut self, dlq: ActorRef<DlqActor>) -> Self {
        self.dlq = Some(dlq);
        self
    }

    pub fn with_health_monitor(mut self, health: ActorRef<HealthMonitorActor>) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    async fn publish(&self, message: &OutboxMessage) -> anyhow::Result<()> {
        let publisher = self.publisher.clone();
        let metrics = self.metrics.clone();

        let mut retried = false;
        let result = retry_with_backoff(self.config.publish_retry.clone(), |attempt| {
            let publisher = publisher.clone();
            if attempt > 1 {
                retried = true;
                if let Some(m) = &metrics {
                    m.record_retry_attempt("outbox_publish", attempt);
                }
            }
            async move { publisher.publish(message).await }
        })
        .await
        .into_result();

        if retried {
            if let Some(m) = &metrics {
                m.record_retry_outcome("outbox_publish", result.is_ok());
            }
        }
        result
    }

    async fn process_batch(&mut self) -> Result<RelayStats, StoreError> {
        let batch = self.store.pending(self.config.batch_size).await?;
        let mut stats = RelayStats {
            fetched: batch.len(),
            ..Default::default()
        };
        if let Some(m) = &self.metrics {
            m.outbox_pending.set(batch.len() as i64);
        }
        if batch.is_empty() {
            return Ok(stats);
        }

        tracing::debug!(message_count = batch.len(), "Fetched pending outbox messages");
        let mut blocked: HashSet<Uuid> = HashSet::new();

        for message in batch {
            if blocked.contains(&message.aggregate_id) {
                stats.deferred += 1;
                continue;
            }

            let started = Instant::now();
            match self.publish(&message).await {
                Ok(()) => {
                    self.store.mark_processed(message.id).await?;
                    self.first_failures.remove(&message.id);
                    stats.published += 1;
                    if let Some(m) = &self.metrics {
                        m.record_publish(&message.event_type, started.elapsed().as_secs_f64(), true);
                    }
                    tracing::debug!(
                        outbox_id = %message.id,
                        event_type = %message.event_type,
                        topic = %message.topic,
                        "Published outbox message"
                    );
                }
                Err(e) => {
                    blocked.insert(message.aggregate_id);
                    stats.failed += 1;
                    if let Some(m) = &self.metrics {
                        m.record_publish(&message.event_type, started.elapsed().as_secs_f64(), false);
                    }
                    if self.handle_failure(message, e).await? {
                        stats.dead_lettered += 1;
                    }
                }
            }
        }

        self.totals.absorb(&stats);
        Ok(stats)
    }

    /// Returns true when the message was dead-lettered.
    async fn handle_failure(
        &mut self,
        message: OutboxMessage,
        error: anyhow::Error,
    ) -> Result<bool, StoreError> {
        let error_message = error.to_string();
        let attempts = self.store.record_failure(message.id, &error_message).await?;
        let first_failed_at = *self.first_failures.entry(message.id).or_insert_with(Utc::now);

        if attempts < self.config.max_attempts {
            tracing::warn!(
                outbox_id = %message.id,
                event_type = %message.event_type,
                attempts,
                error = %error_message,
                "Publish failed, will retry on next poll"
            );
            return Ok(false);
        }

        let Some(dlq) = &self.dlq else {
            tracing::error!(
                outbox_id = %message.id,
                attempts,
                "Publish keeps failing and no DLQ is attached"
            );
            return Ok(false);
        };

        let outbox_id = message.id;
        let result = dlq
            .ask(AddToDlq {
                message,
                error_message,
                failure_count: attempts,
                first_failed_at,
            })
            .await;

        match result {
            Ok(()) => {
                self.first_failures.remove(&outbox_id);
                Ok(true)
            }
            Err(e) => {
                tracing::error!(outbox_id = %outbox_id, error = %e, "Failed to dead-letter message");
                Ok(false)
            }
        }
    }

    async fn report_health(&self, result: &Result<RelayStats, StoreError>) {
        let Some(health) = &self.health else {
            return;
        };

        let (status, details) = match result {
            Ok(stats) if stats.failed == 0 => (HealthStatus::Healthy, None),
            Ok(stats) => (
                HealthStatus::Degraded(format!("{} publish failures in last poll", stats.failed)),
                Some(format!("published {}, deferred {}", stats.published, stats.deferred)),
            ),
            Err(e) => (HealthStatus::Unhealthy(format!("outbox unavailable: {}", e)), None),
        };

        if let Err(e) = health
            .tell(UpdateHealth {
                component: COMPONENT.to_string(),
                status,
                details,
            })
            .send()
            .await
        {
            tracing::debug!(error = %e, "Health monitor unavailable");
        }
    }
}

impl Actor for OutboxRelay {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(state: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!(
            publisher = state.publisher.name(),
            poll_interval_ms = state.config.poll_interval.as_millis() as u64,
            batch_size = state.config.batch_size,
            "OutboxRelay started"
        );

        let interval = state.config.poll_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if actor_ref.tell(PollOutbox).send().await.is_err() {
                    tracing::debug!("OutboxRelay stopped, ending poll loop");
                    break;
                }
            }
        });

        Ok(state)
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Periodic tick.
#[derive(Debug, Clone, Copy)]
pub struct PollOutbox;

/// Process one batch now and report what happened.
#[derive(Debug, Clone, Copy)]
pub struct DrainOutbox;

#[derive(Debug, Clone, Copy)]
pub struct GetRelayStats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reply)]
pub struct RelayStats {
    pub fetched: usize,
    pub published: usize,
    pub failed: usize,
    pub deferred: usize,
    pub dead_lettered: usize,
}

impl RelayStats {
    fn absorb(&mut self, other: &RelayStats) {
        self.fetched += other.fetched;
        self.published += other.published;
        self.failed += other.failed;
        self.deferred += other.deferred;
        self.dead_lettered += other.dead_lettered;
    }
}

impl Message<PollOutbox> for OutboxRelay {
    type Reply = ();

    async fn handle(&mut self, _msg: PollOutbox, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let result = self.process_batch().await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Failed to process outbox batch");
        }
        self.report_health(&result).await;
    }
}

impl Message<DrainOutbox> for OutboxRelay {
    type Reply = Result<RelayStats, StoreError>;

    async fn handle(&mut self, _msg: DrainOutbox, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let result = self.process_batch().await;
        self.report_health(&result).await;
        result
    }
}

impl Message<GetRelayStats> for OutboxRelay {
    type Reply = RelayStats;

    async fn handle(&mut self, _msg: GetRelayStats, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        self.totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::dlq::GetDlqMessages;
    use crate::messaging::RecordingPublisher;
    use crate::persistence::{ChangeSet, EntityStore, InMemoryStore};
    use kameo::prelude::*;
    use serde_json::json;

    fn message(aggregate_id: Uuid, event_type: &str) -> OutboxMessage {
        OutboxMessage::new("order", "order-events", aggregate_id, event_type, json!({}), Uuid::new_v4())
    }

    fn config(max_attempts: i32) -> OutboxRelayConfig {
        OutboxRelayConfig {
            // Long interval: tests drive polls explicitly.
            poll_interval: Duration::from_secs(3600),
            batch_size: 50,
            max_attempts,
            publish_retry: RetryConfig {
                max_attempts: 1,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
                multiplier: 1.0,
            },
        }
    }

    async fn seed(store: &InMemoryStore, messages: Vec<OutboxMessage>) {
        store
            .commit(ChangeSet {
                entities: Vec::new(),
                outbox: messages,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_publishes_pending_messages() {
        let store = Arc::new(InMemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let aggregate = Uuid::new_v4();
        seed(&store, vec![message(aggregate, "OrderPlaced"), message(aggregate, "OrderConfirmed")]).await;

        let relay = OutboxRelay::spawn(OutboxRelay::new(store.clone(), publisher.clone(), config(3)));
        // The first interval tick fires immediately; drain whatever is left.
        let _ = relay.ask(DrainOutbox).await.unwrap();

        assert_eq!(publisher.event_types().await, vec!["OrderPlaced", "OrderConfirmed"]);
        assert!(store.pending(10).await.unwrap().is_empty());
        assert_eq!(relay.ask(GetRelayStats).await.unwrap().published, 2);
    }

    #[tokio::test]
    async fn test_failure_holds_back_same_aggregate_and_moves_to_dlq() {
        let store = Arc::new(InMemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let stuck = Uuid::new_v4();
        let other = Uuid::new_v4();
        seed(
            &store,
            vec![
                message(stuck, "OrderPlaced"),
                message(stuck, "OrderConfirmed"),
                message(other, "ProductCreated"),
            ],
        )
        .await;

        let dlq = DlqActor::spawn(DlqActor::new(store.clone(), None));
        // Driven directly rather than spawned so no periodic tick interleaves.
        let mut relay = OutboxRelay::new(store.clone(), publisher.clone(), config(2)).with_dlq(dlq.clone());

        publisher.fail_next(1, "broker down").await;
        let first = relay.process_batch().await.unwrap();
        assert_eq!(first.failed, 1);
        assert_eq!(first.deferred, 1);
        assert_eq!(first.published, 1);
        assert_eq!(publisher.event_types().await, vec!["ProductCreated"]);

        publisher.fail_next(1, "broker down").await;
        let second = relay.process_batch().await.unwrap();
        assert_eq!(second.dead_lettered, 1);

        let third = relay.process_batch().await.unwrap();
        assert_eq!(third.published, 1);
        assert_eq!(publisher.event_types().await, vec!["ProductCreated", "OrderConfirmed"]);

        let letters = dlq.ask(GetDlqMessages { limit: 10 }).await.unwrap();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].event_type, "OrderPlaced");
        assert_eq!(letters[0].failure_count, 2);
        assert!(store.pending(10).await.unwrap().is_empty());
    }
}

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::persistence::OutboxMessage;
use crate::utils::CircuitState;

/// Wire format of a published domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub event_type: String,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub correlation_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl From<&OutboxMessage> for EventEnvelope {
    fn from(message: &OutboxMessage) -> Self {
        Self {
            event_id: message.id,
            event_type: message.event_type.clone(),
            aggregate_type: message.aggregate_type.clone(),
            aggregate_id: message.aggregate_id,
            correlation_id: message.correlation_id,
            occurred_at: message.created_at,
            payload: message.payload.clone(),
        }
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn publish(&self, message: &OutboxMessage) -> anyhow::Result<()>;

    /// Breaker state for publishers that have one.
    async fn circuit_state(&self) -> Option<CircuitState> {
        None
    }
}

/// Used when no broker is configured: events are only logged.
#[derive(Debug, Default)]
pub struct LoggingPublisher;

#[async_trait]
impl EventPublisher for LoggingPublisher {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn publish(&self, message: &OutboxMessage) -> anyhow::Result<()> {
        tracing::info!(
            topic = %message.topic,
            event_type = %message.event_type,
            aggregate_id = %message.aggregate_id,
            correlation_id = %message.correlation_id,
            "Domain event"
        );
        Ok(())
    }
}

/// Keeps published envelopes in memory; can be told to fail the next calls.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<EventEnvelope>>,
    failures: Mutex<VecDeque<String>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` publishes fail with `error`.
    pub async fn fail_next(&self, count: usize, error: &str) {
        let mut failures = self.failures.lock().await;
        failures.extend(std::iter::repeat(error.to_string()).take(count));
    }

    pub async fn published(&self) -> Vec<EventEnvelope> {
        self.published.lock().await.clone()
    }

    pub async fn event_types(&self) -> Vec<String> {
        self.published
            .lock()
            .await
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn publish(&self, message: &OutboxMessage) -> anyhow::Result<()> {
        if let Some(error) = self.failures.lock().await.pop_front() {
            anyhow::bail!("{}", error);
        }
        self.published.lock().await.push(EventEnvelope::from(message));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message() -> OutboxMessage {
        OutboxMessage::new(
            "order",
            "order-events",
            Uuid::new_v4(),
            "OrderPlaced",
            json!({"total": 1200}),
            Uuid::new_v4(),
        )
    }

    #[tokio::test]
    async fn test_recording_publisher_fails_on_demand() {
        let publisher = RecordingPublisher::new();
        publisher.fail_next(1, "broker down").await;

        let msg = message();
        let err = publisher.publish(&msg).await.unwrap_err();
        assert_eq!(err.to_string(), "broker down");

        publisher.publish(&msg).await.unwrap();
        let published = publisher.published().await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event_id, msg.id);
        assert_eq!(published[0].payload["total"], 1200);
    }

    #[test]
    fn test_envelope_from_outbox_message() {
        let msg = message();
        let envelope = EventEnvelope::from(&msg);
        assert_eq!(envelope.aggregate_type, "order");
        assert_eq!(envelope.correlation_id, msg.correlation_id);
        assert_eq!(envelope.occurred_at, msg.created_at);
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kameo::actor::ActorRef;
use kameo::error::Infallible;
use kameo::message::{Context, Message};
use kameo::Actor;
use uuid::Uuid;

use crate::metrics::Metrics;
use crate::persistence::{DeadLetter, OutboxMessage, OutboxStore, StoreError};

// ============================================================================
// Dead Letter Queue Actor
// ============================================================================
//
// Receives outbox messages the relay gave up on:
// - stores them in the dead letter table for manual intervention
// - marks the outbox row processed so the relay stops picking it up
// - counts them by event type
//
// ============================================================================

const STATS_SCAN_LIMIT: i64 = 10_000;

pub struct DlqActor {
    store: Arc<dyn OutboxStore>,
    metrics: Option<Arc<Metrics>>,
}

impl DlqActor {
    pub fn new(store: Arc<dyn OutboxStore>, metrics: Option<Arc<Metrics>>) -> Self {
        Self { store, metrics }
    }
}

impl Actor for DlqActor {
    type Args = Self;
    type Error = Infallible;

    async fn on_start(state: Self::Args, _actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        tracing::info!("DlqActor started");
        Ok(state)
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone)]
pub struct AddToDlq {
    pub message: OutboxMessage,
    pub error_message: String,
    pub failure_count: i32,
    pub first_failed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct GetDlqMessages {
    pub limit: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct GetDlqStats;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DlqStats {
    pub total_messages: usize,
    pub by_event_type: HashMap<String, usize>,
}

// ============================================================================
// Handlers
// ============================================================================

impl Message<AddToDlq> for DlqActor {
    type Reply = Result<(), StoreError>;

    async fn handle(&mut self, msg: AddToDlq, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let AddToDlq {
            message,
            error_message,
            failure_count,
            first_failed_at,
        } = msg;

        tracing::error!(
            outbox_id = %message.id,
            event_type = %message.event_type,
            aggregate_id = %message.aggregate_id,
            error = %error_message,
            failure_count,
            "Moving message to dead letter queue"
        );

        let letter = DeadLetter {
            id: Uuid::now_v7(),
            outbox_id: message.id,
            aggregate_id: message.aggregate_id,
            event_type: message.event_type.clone(),
            topic: message.topic.clone(),
            payload: message.payload.clone(),
            error_message,
            failure_count,
            first_failed_at,
            last_failed_at: Utc::now(),
        };

        self.store.dead_letter(letter).await?;
        self.store.mark_processed(message.id).await?;

        if let Some(metrics) = &self.metrics {
            metrics.record_dlq_message(&message.event_type);
        }
        Ok(())
    }
}

impl Message<GetDlqMessages> for DlqActor {
    type Reply = Result<Vec<DeadLetter>, StoreError>;

    async fn handle(
        &mut self,
        msg: GetDlqMessages,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.store.dead_letters(msg.limit).await
    }
}

impl Message<GetDlqStats> for DlqActor {
    type Reply = Result<DlqStats, StoreError>;

    async fn handle(&mut self, _msg: GetDlqStats, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let letters = self.store.dead_letters(STATS_SCAN_LIMIT).await?;

        let mut stats = DlqStats {
            total_messages: letters.len(),
            ..Default::default()
        };
        for letter in letters {
            *stats.by_event_type.entry(letter.event_type).or_insert(0) += 1;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{ChangeSet, EntityStore, InMemoryStore};
    use kameo::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_dead_letters_are_stored_and_counted() {
        let store = Arc::new(InMemoryStore::new());
        let message = OutboxMessage::new(
            "order",
            "order-events",
            Uuid::new_v4(),
            "OrderPlaced",
            json!({}),
            Uuid::new_v4(),
        );
        store
            .commit(ChangeSet {
                entities: Vec::new(),
                outbox: vec![message.clone()],
            })
            .await
            .unwrap();

        let dlq = DlqActor::spawn(DlqActor::new(store.clone(), None));
        dlq.ask(AddToDlq {
            message: message.clone(),
            error_message: "broker down".to_string(),
            failure_count: 5,
            first_failed_at: Utc::now(),
        })
        .await
        .unwrap();

        let letters = dlq.ask(GetDlqMessages { limit: 10 }).await.unwrap();
        assert_eq!(letters.len(), 1);
        assert_eq!(letters[0].outbox_id, message.id);
        assert_eq!(letters[0].failure_count, 5);

        let stats = dlq.ask(GetDlqStats).await.unwrap();
        assert_eq!(stats.total_messages, 1);
        assert_eq!(stats.by_event_type.get("OrderPlaced"), Some(&1));

        assert!(store.pending(10).await.unwrap().is_empty());
    }
}

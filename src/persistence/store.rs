use async_trait::async_trait;
use uuid::Uuid;

use super::record::{ChangeSet, Criteria, DeadLetter, OutboxMessage, QueryResult, StoredRecord};

// ============================================================================
// Store Abstractions
// ============================================================================
//
// `EntityStore` is the data-context seam: handlers never see SQL. Both traits
// are object-safe so the application holds `Arc<dyn ...>` and swaps
// Postgres for the in-memory store in tests.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} was modified concurrently (expected version {expected})")]
    Conflict { kind: String, id: Uuid, expected: i64 },

    #[error("A {kind} with {field} '{value}' already exists")]
    Duplicate {
        kind: String,
        field: &'static str,
        value: String,
    },

    #[error("Outbox message not found: {0}")]
    OutboxMessageNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Load a single record. Soft-deleted rows are hidden unless requested.
    async fn find(
        &self,
        kind: &str,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<StoredRecord>, StoreError>;

    async fn query(&self, kind: &str, criteria: &Criteria) -> Result<QueryResult, StoreError>;

    /// Apply every write and outbox message atomically, or none of them.
    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;
}

#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Unprocessed messages, oldest first.
    async fn pending(&self, limit: i64) -> Result<Vec<OutboxMessage>, StoreError>;

    async fn mark_processed(&self, id: Uuid) -> Result<(), StoreError>;

    /// Increment the attempt counter and keep the last error.
    async fn record_failure(&self, id: Uuid, error: &str) -> Result<i32, StoreError>;

    async fn dead_letter(&self, message: DeadLetter) -> Result<(), StoreError>;

    async fn dead_letters(&self, limit: i64) -> Result<Vec<DeadLetter>, StoreError>;
}

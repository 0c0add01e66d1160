use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::record::{
    ChangeSet, Criteria, DeadLetter, OutboxMessage, QueryResult, SortKey, StoredRecord,
};
use super::store::{EntityStore, OutboxStore, StoreError};

// ============================================================================
// Postgres Store - JSONB documents with version-checked writes
// ============================================================================
//
// Tables:
// - entities           (kind, id) → version, soft-delete flag, JSONB data
// - entity_unique_keys (kind, field, value) → owning entity id
// - outbox_messages    written in the same transaction as the entities
// - dead_letter_queue  messages the relay gave up on
//
// Writes:
// - insert: INSERT ... ON CONFLICT DO NOTHING, zero rows → conflict
// - update: UPDATE ... WHERE version = expected, zero rows → conflict
// - unique keys: INSERT ... ON CONFLICT DO UPDATE RETURNING the owner,
//   another owner → duplicate
// Any conflict returns early and the transaction is rolled back on drop.
//
// ============================================================================

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS entities (
        kind TEXT NOT NULL,
        id UUID NOT NULL,
        version BIGINT NOT NULL,
        is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        data JSONB NOT NULL,
        PRIMARY KEY (kind, id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_entities_data ON entities USING GIN (data jsonb_path_ops)",
    "CREATE INDEX IF NOT EXISTS idx_entities_live ON entities (kind, created_at) WHERE NOT is_deleted",
    "CREATE TABLE IF NOT EXISTS entity_unique_keys (
        kind TEXT NOT NULL,
        field TEXT NOT NULL,
        value TEXT NOT NULL,
        entity_id UUID NOT NULL,
        PRIMARY KEY (kind, field, value)
    )",
    "CREATE TABLE IF NOT EXISTS outbox_messages (
        id UUID PRIMARY KEY,
        aggregate_id UUID NOT NULL,
        aggregate_type TEXT NOT NULL,
        event_type TEXT NOT NULL,
        payload JSONB NOT NULL,
        topic TEXT NOT NULL,
        partition_key TEXT NOT NULL,
        correlation_id UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        attempts INT NOT NULL DEFAULT 0,
        processed_at TIMESTAMPTZ,
        last_error TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_outbox_pending ON outbox_messages (created_at) WHERE processed_at IS NULL",
    "CREATE TABLE IF NOT EXISTS dead_letter_queue (
        id UUID PRIMARY KEY,
        outbox_id UUID NOT NULL,
        aggregate_id UUID NOT NULL,
        event_type TEXT NOT NULL,
        topic TEXT NOT NULL,
        payload JSONB NOT NULL,
        error_message TEXT NOT NULL,
        failure_count INT NOT NULL,
        first_failed_at TIMESTAMPTZ NOT NULL,
        last_failed_at TIMESTAMPTZ NOT NULL
    )",
];

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        tracing::info!(max_connections, "Connected to Postgres");
        Ok(Self::new(pool))
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema ready");
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, kind: &'a str, criteria: &'a Criteria) {
    builder.push(" WHERE kind = ").push_bind(kind);
    if !criteria.include_deleted {
        builder.push(" AND NOT is_deleted");
    }
    if let Some(from) = criteria.created_from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = criteria.created_before {
        builder.push(" AND created_at < ").push_bind(to);
    }
    if !criteria.filters.is_empty() {
        builder
            .push(" AND data @> ")
            .push_bind(serde_json::Value::Object(criteria.filters.clone()));
    }
}

fn record_from_row(row: &PgRow) -> Result<StoredRecord, sqlx::Error> {
    Ok(StoredRecord {
        kind: row.try_get("kind")?,
        id: row.try_get("id")?,
        version: row.try_get("version")?,
        is_deleted: row.try_get("is_deleted")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        data: row.try_get("data")?,
    })
}

fn outbox_from_row(row: &PgRow) -> Result<OutboxMessage, sqlx::Error> {
    Ok(OutboxMessage {
        id: row.try_get("id")?,
        aggregate_id: row.try_get("aggregate_id")?,
        aggregate_type: row.try_get("aggregate_type")?,
        event_type: row.try_get("event_type")?,
        payload: row.try_get("payload")?,
        topic: row.try_get("topic")?,
        partition_key: row.try_get("partition_key")?,
        correlation_id: row.try_get("correlation_id")?,
        created_at: row.try_get("created_at")?,
        attempts: row.try_get("attempts")?,
        processed_at: row.try_get::<Option<DateTime<Utc>>, _>("processed_at")?,
        last_error: row.try_get("last_error")?,
    })
}

fn dead_letter_from_row(row: &PgRow) -> Result<DeadLetter, sqlx::Error> {
    Ok(DeadLetter {
        id: row.try_get("id")?,
        outbox_id: row.try_get("outbox_id")?,
        aggregate_id: row.try_get("aggregate_id")?,
        event_type: row.try_get("event_type")?,
        topic: row.try_get("topic")?,
        payload: row.try_get("payload")?,
        error_message: row.try_get("error_message")?,
        failure_count: row.try_get("failure_count")?,
        first_failed_at: row.try_get("first_failed_at")?,
        last_failed_at: row.try_get("last_failed_at")?,
    })
}

#[async_trait]
impl EntityStore for PgStore {
    async fn find(
        &self,
        kind: &str,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT kind, id, version, is_deleted, created_at, updated_at, data
             FROM entities
             WHERE kind = $1 AND id = $2 AND ($3 OR NOT is_deleted)",
        )
        .bind(kind)
        .bind(id)
        .bind(include_deleted)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(record_from_row).transpose()?)
    }

    async fn query(&self, kind: &str, criteria: &Criteria) -> Result<QueryResult, StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM entities");
        push_filters(&mut count, kind, criteria);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(
            "SELECT kind, id, version, is_deleted, created_at, updated_at, data FROM entities",
        );
        push_filters(&mut select, kind, criteria);

        match &criteria.sort {
            Some(sort) => {
                match &sort.key {
                    SortKey::CreatedAt => {
                        select.push(" ORDER BY created_at");
                    }
                    SortKey::UpdatedAt => {
                        select.push(" ORDER BY updated_at");
                    }
                    SortKey::Field(field) => {
                        select.push(" ORDER BY data -> ").push_bind(field.as_str());
                    }
                }
                select.push(if sort.descending { " DESC" } else { " ASC" });
                select.push(", id");
            }
            None => {
                select.push(" ORDER BY created_at, id");
            }
        }

        if let Some(limit) = criteria.limit {
            select
                .push(" LIMIT ")
                .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if criteria.offset > 0 {
            select
                .push(" OFFSET ")
                .push_bind(i64::try_from(criteria.offset).unwrap_or(i64::MAX));
        }

        let rows = select.build().fetch_all(&self.pool).await?;
        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QueryResult {
            records,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for write in &changes.entities {
            let record = &write.record;
            let affected = if write.is_insert() {
                sqlx::query(
                    "INSERT INTO entities (kind, id, version, is_deleted, created_at, updated_at, data)
                     VALUES ($1, $2, $3, $4, $5, $6, $7)
                     ON CONFLICT (kind, id) DO NOTHING",
                )
                .bind(&record.kind)
                .bind(record.id)
                .bind(record.version)
                .bind(record.is_deleted)
                .bind(record.created_at)
                .bind(record.updated_at)
                .bind(&record.data)
                .execute(&mut *tx)
                .await?
                .rows_affected()
            } else {
                sqlx::query(
                    "UPDATE entities
                     SET version = $3, is_deleted = $4, updated_at = $5, data = $6
                     WHERE kind = $1 AND id = $2 AND version = $7",
                )
                .bind(&record.kind)
                .bind(record.id)
                .bind(record.version)
                .bind(record.is_deleted)
                .bind(record.updated_at)
                .bind(&record.data)
                .bind(write.expected_version)
                .execute(&mut *tx)
                .await?
                .rows_affected()
            };

            if affected == 0 {
                tracing::warn!(
                    kind = %record.kind,
                    id = %record.id,
                    expected_version = write.expected_version,
                    "Optimistic concurrency conflict, rolling back"
                );
                return Err(StoreError::Conflict {
                    kind: record.kind.clone(),
                    id: record.id,
                    expected: write.expected_version,
                });
            }

            for unique in &write.unique_keys {
                // The no-op update makes RETURNING yield the existing owner.
                let owner: Uuid = sqlx::query_scalar(
                    "INSERT INTO entity_unique_keys (kind, field, value, entity_id)
                     VALUES ($1, $2, $3, $4)
                     ON CONFLICT (kind, field, value)
                     DO UPDATE SET entity_id = entity_unique_keys.entity_id
                     RETURNING entity_id",
                )
                .bind(&record.kind)
                .bind(unique.field)
                .bind(&unique.value)
                .bind(record.id)
                .fetch_one(&mut *tx)
                .await?;

                if owner != record.id {
                    tracing::warn!(
                        kind = %record.kind,
                        field = unique.field,
                        value = %unique.value,
                        "Unique key already claimed, rolling back"
                    );
                    return Err(StoreError::Duplicate {
                        kind: record.kind.clone(),
                        field: unique.field,
                        value: unique.value.clone(),
                    });
                }
            }
        }

        for message in &changes.outbox {
            sqlx::query(
                "INSERT INTO outbox_messages (
                    id, aggregate_id, aggregate_type, event_type, payload, topic,
                    partition_key, correlation_id, created_at, attempts
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 0)",
            )
            .bind(message.id)
            .bind(message.aggregate_id)
            .bind(&message.aggregate_type)
            .bind(&message.event_type)
            .bind(&message.payload)
            .bind(&message.topic)
            .bind(&message.partition_key)
            .bind(message.correlation_id)
            .bind(message.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            entities = changes.entities.len(),
            outbox_messages = changes.outbox.len(),
            "Committed change set"
        );
        Ok(())
    }
}

#[async_trait]
impl OutboxStore for PgStore {
    async fn pending(&self, limit: i64) -> Result<Vec<OutboxMessage>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, aggregate_id, aggregate_type, event_type, payload, topic, partition_key,
                    correlation_id, created_at, attempts, processed_at, last_error
             FROM outbox_messages
             WHERE processed_at IS NULL
             ORDER BY created_at
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(outbox_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), StoreError> {
        let affected = sqlx::query("UPDATE outbox_messages SET processed_at = $2 WHERE id = $1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(StoreError::OutboxMessageNotFound(id));
        }
        Ok(())
    }

    async fn record_failure(&self, id: Uuid, error: &str) -> Result<i32, StoreError> {
        let attempts: Option<i32> = sqlx::query_scalar(
            "UPDATE outbox_messages
             SET attempts = attempts + 1, last_error = $2
             WHERE id = $1
             RETURNING attempts",
        )
        .bind(id)
        .bind(error)
        .fetch_optional(&self.pool)
        .await?;

        attempts.ok_or(StoreError::OutboxMessageNotFound(id))
    }

    async fn dead_letter(&self, message: DeadLetter) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO dead_letter_queue (
                id, outbox_id, aggregate_id, event_type, topic, payload,
                error_message, failure_count, first_failed_at, last_failed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(message.id)
        .bind(message.outbox_id)
        .bind(message.aggregate_id)
        .bind(&message.event_type)
        .bind(&message.topic)
        .bind(&message.payload)
        .bind(&message.error_message)
        .bind(message.failure_count)
        .bind(message.first_failed_at)
        .bind(message.last_failed_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            outbox_id = %message.outbox_id,
            event_type = %message.event_type,
            "Stored dead letter"
        );
        Ok(())
    }

    async fn dead_letters(&self, limit: i64) -> Result<Vec<DeadLetter>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, outbox_id, aggregate_id, event_type, topic, payload, error_message,
                    failure_count, first_failed_at, last_failed_at
             FROM dead_letter_queue
             ORDER BY last_failed_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(dead_letter_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::record::{
    compare_json, json_contains, ChangeSet, Criteria, DeadLetter, OutboxMessage, QueryResult,
    SortKey, StoredRecord,
};
use super::store::{EntityStore, OutboxStore, StoreError};

// ============================================================================
// In-Memory Store - used by tests and the demo run
// ============================================================================
//
// Mirrors the Postgres store semantics: soft-delete filtering, JSON
// containment filters, version-checked writes, and all-or-nothing commits
// (validated under one write lock before anything is applied).
//
// ============================================================================

#[derive(Default)]
struct State {
    entities: HashMap<(String, Uuid), StoredRecord>,
    // (kind, field, value) → owning entity
    unique_keys: HashMap<(String, &'static str, String), Uuid>,
    outbox: Vec<OutboxMessage>,
    dead_letters: Vec<DeadLetter>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every outbox message ever written, processed or not.
    pub async fn outbox_messages(&self) -> Vec<OutboxMessage> {
        self.state.read().await.outbox.clone()
    }

    pub async fn entity_count(&self, kind: &str) -> usize {
        self.state
            .read()
            .await
            .entities
            .keys()
            .filter(|(k, _)| k == kind)
            .count()
    }
}

fn sort_value<'a>(record: &'a StoredRecord, field: &str) -> &'a serde_json::Value {
    record.data.get(field).unwrap_or(&serde_json::Value::Null)
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn find(
        &self,
        kind: &str,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .entities
            .get(&(kind.to_string(), id))
            .filter(|r| include_deleted || !r.is_deleted)
            .cloned())
    }

    async fn query(&self, kind: &str, criteria: &Criteria) -> Result<QueryResult, StoreError> {
        let state = self.state.read().await;
        let filter = serde_json::Value::Object(criteria.filters.clone());

        let mut matches: Vec<StoredRecord> = state
            .entities
            .values()
            .filter(|r| r.kind == kind)
            .filter(|r| criteria.include_deleted || !r.is_deleted)
            .filter(|r| criteria.is_created_within(r.created_at))
            .filter(|r| json_contains(&r.data, &filter))
            .cloned()
            .collect();

        // Stable base order so pagination is deterministic.
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        if let Some(sort) = &criteria.sort {
            matches.sort_by(|a, b| {
                let ordering = match &sort.key {
                    SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                    SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                    SortKey::Field(field) => compare_json(sort_value(a, field), sort_value(b, field)),
                };
                if sort.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        let total = matches.len() as u64;
        let offset = usize::try_from(criteria.offset).unwrap_or(usize::MAX);
        let records = match criteria.limit {
            Some(limit) => matches
                .into_iter()
                .skip(offset)
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            None => matches.into_iter().skip(offset).collect(),
        };

        Ok(QueryResult { records, total })
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut state = self.state.write().await;

        for write in &changes.entities {
            let key = (write.record.kind.clone(), write.record.id);
            let current = state.entities.get(&key).map(|r| r.version).unwrap_or(0);
            if current != write.expected_version {
                return Err(StoreError::Conflict {
                    kind: write.record.kind.clone(),
                    id: write.record.id,
                    expected: write.expected_version,
                });
            }
        }

        let mut claims = HashMap::new();
        for write in &changes.entities {
            for unique in &write.unique_keys {
                let key = (write.record.kind.clone(), unique.field, unique.value.clone());
                let owner = claims
                    .get(&key)
                    .or_else(|| state.unique_keys.get(&key))
                    .copied();
                if owner.is_some_and(|owner| owner != write.record.id) {
                    return Err(StoreError::Duplicate {
                        kind: write.record.kind.clone(),
                        field: unique.field,
                        value: unique.value.clone(),
                    });
                }
                claims.insert(key, write.record.id);
            }
        }

        state.unique_keys.extend(claims);
        for write in changes.entities {
            let key = (write.record.kind.clone(), write.record.id);
            state.entities.insert(key, write.record);
        }
        state.outbox.extend(changes.outbox);

        Ok(())
    }
}

#[async_trait]
impl OutboxStore for InMemoryStore {
    async fn pending(&self, limit: i64) -> Result<Vec<OutboxMessage>, StoreError> {
        let state = self.state.read().await;
        let mut pending: Vec<_> = state
            .outbox
            .iter()
            .filter(|m| !m.is_processed())
            .cloned()
            .collect();
        pending.sort_by_key(|m| m.created_at);
        pending.truncate(usize::try_from(limit.max(0)).unwrap_or(0));
        Ok(pending)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let message = state
            .outbox
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::OutboxMessageNotFound(id))?;
        message.processed_at = Some(Utc::now());
        Ok(())
    }

    async fn record_failure(&self, id: Uuid, error: &str) -> Result<i32, StoreError> {
        let mut state = self.state.write().await;
        let message = state
            .outbox
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::OutboxMessageNotFound(id))?;
        message.attempts += 1;
        message.last_error = Some(error.to_string());
        Ok(message.attempts)
    }

    async fn dead_letter(&self, message: DeadLetter) -> Result<(), StoreError> {
        self.state.write().await.dead_letters.push(message);
        Ok(())
    }

    async fn dead_letters(&self, limit: i64) -> Result<Vec<DeadLetter>, StoreError> {
        let state = self.state.read().await;
        let mut letters = state.dead_letters.clone();
        letters.sort_by(|a, b| b.last_failed_at.cmp(&a.last_failed_at));
        letters.truncate(usize::try_from(limit.max(0)).unwrap_or(0));
        Ok(letters)
    }
}

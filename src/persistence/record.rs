use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::common::PageRequest;

// ============================================================================
// Stored Records - the storage-level shape of every entity
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub kind: String,
    pub id: Uuid,
    pub version: i64,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data: Value,
}

/// A value that at most one entity of a kind may ever hold, soft-deleted
/// rows included. The first commit to claim it keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    pub field: &'static str,
    pub value: String,
}

impl UniqueKey {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// One staged write. `expected_version == 0` means insert.
#[derive(Debug, Clone)]
pub struct EntityWrite {
    pub record: StoredRecord,
    pub expected_version: i64,
    pub unique_keys: Vec<UniqueKey>,
}

impl EntityWrite {
    pub fn is_insert(&self) -> bool {
        self.expected_version == 0
    }
}

/// Everything a unit of work commits atomically.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub entities: Vec<EntityWrite>,
    pub outbox: Vec<OutboxMessage>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.outbox.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub records: Vec<StoredRecord>,
    pub total: u64,
}

// ============================================================================
// Outbox Messages
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub aggregate_type: String,
    pub event_type: String,
    pub payload: Value,
    pub topic: String,
    pub partition_key: String,
    pub correlation_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub attempts: i32,
    pub processed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl OutboxMessage {
    pub fn new(
        aggregate_type: &str,
        topic: &str,
        aggregate_id: Uuid,
        event_type: &str,
        payload: Value,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            aggregate_id,
            aggregate_type: aggregate_type.to_string(),
            event_type: event_type.to_string(),
            payload,
            topic: topic.to_string(),
            partition_key: aggregate_id.to_string(),
            correlation_id,
            created_at: Utc::now(),
            attempts: 0,
            processed_at: None,
            last_error: None,
        }
    }

    pub fn is_processed(&self) -> bool {
        self.processed_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub id: Uuid,
    pub outbox_id: Uuid,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub topic: String,
    pub payload: Value,
    pub error_message: String,
    pub failure_count: i32,
    pub first_failed_at: DateTime<Utc>,
    pub last_failed_at: DateTime<Utc>,
}

// ============================================================================
// Query Criteria
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    CreatedAt,
    UpdatedAt,
    Field(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub key: SortKey,
    pub descending: bool,
}

/// Filters are JSON equality matches with containment semantics: a filter
/// value that is an array matches documents whose array contains those
/// elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub filters: Map<String, Value>,
    /// Inclusive lower bound on the record's creation time.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the record's creation time.
    pub created_before: Option<DateTime<Utc>>,
    pub include_deleted: bool,
    pub sort: Option<Sort>,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Serialize) -> Self {
        self.filters.insert(field.to_string(), serde_json::json!(value));
        self
    }

    /// Add the filter only when a value is present.
    pub fn eq_opt<T: Serialize>(self, field: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    /// Match documents whose array field contains the value.
    pub fn contains(mut self, field: &str, value: impl Serialize) -> Self {
        self.filters
            .insert(field.to_string(), Value::Array(vec![serde_json::json!(value)]));
        self
    }

    /// Records created in `[from, to)`.
    pub fn created_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.created_from = Some(from);
        self.created_before = Some(to);
        self
    }

    pub fn is_created_within(&self, created_at: DateTime<Utc>) -> bool {
        self.created_from.map_or(true, |from| created_at >= from)
            && self.created_before.map_or(true, |to| created_at < to)
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.sort = Some(Sort {
            key: SortKey::CreatedAt,
            descending: true,
        });
        self
    }

    pub fn oldest_first(mut self) -> Self {
        self.sort = Some(Sort {
            key: SortKey::CreatedAt,
            descending: false,
        });
        self
    }

    pub fn order_by(mut self, field: &str, descending: bool) -> Self {
        self.sort = Some(Sort {
            key: SortKey::Field(field.to_string()),
            descending,
        });
        self
    }

    pub fn page(mut self, page: PageRequest) -> Self {
        self.offset = page.offset();
        self.limit = Some(page.limit());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

// ============================================================================
// JSON helpers shared by the in-memory store
// ============================================================================

/// Postgres `@>` semantics for JSON documents.
pub fn json_contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::Object(h), Value::Object(n)) => n
            .iter()
            .all(|(k, nv)| h.get(k).is_some_and(|hv| json_contains(hv, nv))),
        (Value::Array(h), Value::Array(n)) => n
            .iter()
            .all(|nv| h.iter().any(|hv| json_contains(hv, nv))),
        (Value::Array(h), scalar) => h.iter().any(|hv| hv == scalar),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (a, b) => a == b,
    }
}

/// Ordering for sort keys: null < bool < number < string; others by text.
pub fn compare_json(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ if rank(a) != rank(b) => rank(a).cmp(&rank(b)),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_contains_object_subset() {
        let doc = json!({"seller_id": "a", "is_active": true, "price": 10});
        assert!(json_contains(&doc, &json!({"seller_id": "a"})));
        assert!(json_contains(&doc, &json!({"seller_id": "a", "is_active": true})));
        assert!(!json_contains(&doc, &json!({"seller_id": "b"})));
        assert!(!json_contains(&doc, &json!({"missing": 1})));
    }

    #[test]
    fn test_json_contains_numbers_compare_by_value() {
        let doc = json!({"price": 10.0});
        assert!(json_contains(&doc, &json!({"price": 10})));
    }

    #[test]
    fn test_json_contains_arrays() {
        let doc = json!({"featured_products": ["p1", "p2", "p3"]});
        assert!(json_contains(&doc, &json!({"featured_products": ["p2"]})));
        assert!(!json_contains(&doc, &json!({"featured_products": ["p9"]})));
    }

    #[test]
    fn test_compare_json() {
        use std::cmp::Ordering;
        assert_eq!(compare_json(&json!(1), &json!(2)), Ordering::Less);
        assert_eq!(compare_json(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_json(&Value::Null, &json!(0)), Ordering::Less);
    }

    #[test]
    fn test_created_window_is_half_open() {
        let from = Utc::now();
        let to = from + chrono::Duration::hours(1);
        let criteria = Criteria::new().created_between(from, to);

        assert!(criteria.is_created_within(from));
        assert!(!criteria.is_created_within(to));
        assert!(!criteria.is_created_within(from - chrono::Duration::seconds(1)));
        assert!(Criteria::new().is_created_within(to));
    }

    #[test]
    fn test_criteria_builder() {
        let seller = Uuid::new_v4();
        let criteria = Criteria::new()
            .eq("seller_id", seller)
            .eq_opt::<bool>("is_active", None)
            .newest_first()
            .page(PageRequest::new(2, 10));

        assert_eq!(criteria.filters.len(), 1);
        assert_eq!(criteria.filters["seller_id"], json!(seller.to_string()));
        assert_eq!(criteria.offset, 10);
        assert_eq!(criteria.limit, Some(10));
        assert!(!criteria.include_deleted);
    }
}

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::UniqueKey;

// ============================================================================
// Entity Base - identity, audit timestamps, soft delete, version
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityBase {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    #[serde(default)]
    pub version: i64,
}

impl EntityBase {
    pub fn new() -> Self {
        Self::with_id(Uuid::now_v7())
    }

    pub fn with_id(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
            is_deleted: false,
            version: 0,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Returns false when the entity was already deleted.
    pub fn mark_deleted(&mut self) -> bool {
        if self.is_deleted {
            return false;
        }
        self.is_deleted = true;
        self.touch();
        true
    }

    pub fn is_new(&self) -> bool {
        self.version == 0
    }
}

impl Default for EntityBase {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Domain Events
// ============================================================================

/// Events recorded by entity mutators and written to the outbox on save.
pub trait DomainEvent: Serialize + Send + Sync {
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// Entity Trait
// ============================================================================

/// A persisted domain entity.
///
/// Entities keep pending domain events in a non-serialized field; the unit of
/// work drains them into outbox messages when the entity is staged.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Event: DomainEvent;

    /// Storage discriminator and outbox aggregate type, e.g. "order".
    const KIND: &'static str;

    /// Topic the outbox relay publishes this entity's events to.
    const TOPIC: &'static str;

    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    fn take_events(&mut self) -> Vec<Self::Event>;

    /// Values the store must keep unique per kind.
    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }

    fn id(&self) -> Uuid {
        self.base().id
    }

    fn version(&self) -> i64 {
        self.base().version
    }

    fn is_deleted(&self) -> bool {
        self.base().is_deleted
    }
}

use std::sync::Arc;

use uuid::Uuid;

use crate::error::AppError;
use super::entity::{DomainEvent, Entity};
use super::record::{ChangeSet, EntityWrite, OutboxMessage, StoredRecord};
use super::store::EntityStore;

// ============================================================================
// Unit of Work - stages entity writes and their outbox messages
// ============================================================================
//
// Staging an entity:
//   1. drain its pending domain events into outbox messages
//   2. bump its version (expected = version before the first staging)
//   3. snapshot it as a JSON record
//
// save_changes() commits every staged record and outbox message in one
// store transaction.
//
// ============================================================================

pub struct UnitOfWork {
    store: Arc<dyn EntityStore>,
    correlation_id: Uuid,
    writes: Vec<EntityWrite>,
    outbox: Vec<OutboxMessage>,
}

impl UnitOfWork {
    pub(crate) fn new(store: Arc<dyn EntityStore>, correlation_id: Uuid) -> Self {
        Self {
            store,
            correlation_id,
            writes: Vec::new(),
            outbox: Vec::new(),
        }
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Stage a new entity.
    pub fn add<E: Entity>(&mut self, entity: &mut E) -> Result<(), AppError> {
        if !entity.base().is_new() && !self.is_staged::<E>(entity.id()) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "{} {} is already persisted; use update",
                E::KIND,
                entity.id()
            )));
        }
        self.stage(entity)
    }

    /// Stage changes to a loaded entity.
    pub fn update<E: Entity>(&mut self, entity: &mut E) -> Result<(), AppError> {
        self.stage(entity)
    }

    pub fn staged_entities(&self) -> usize {
        self.writes.len()
    }

    pub fn staged_events(&self) -> usize {
        self.outbox.len()
    }

    fn is_staged<E: Entity>(&self, id: Uuid) -> bool {
        self.writes
            .iter()
            .any(|w| w.record.kind == E::KIND && w.record.id == id)
    }

    fn stage<E: Entity>(&mut self, entity: &mut E) -> Result<(), AppError> {
        let id = entity.id();

        for event in entity.take_events() {
            let payload = serde_json::to_value(&event)?;
            self.outbox.push(OutboxMessage::new(
                E::KIND,
                E::TOPIC,
                id,
                event.event_type(),
                payload,
                self.correlation_id,
            ));
        }

        let existing = self
            .writes
            .iter()
            .position(|w| w.record.kind == E::KIND && w.record.id == id);

        let expected_version = match existing {
            Some(index) => self.writes[index].expected_version,
            None => entity.version(),
        };
        entity.base_mut().version = expected_version + 1;

        let base = entity.base();
        let record = StoredRecord {
            kind: E::KIND.to_string(),
            id,
            version: base.version,
            is_deleted: base.is_deleted,
            created_at: base.created_at,
            updated_at: base.updated_at,
            data: serde_json::to_value(&*entity)?,
        };

        let write = EntityWrite {
            record,
            expected_version,
            unique_keys: entity.unique_keys(),
        };
        match existing {
            Some(index) => self.writes[index] = write,
            None => self.writes.push(write),
        }

        Ok(())
    }

    /// Commit everything staged. Returns the number of entities written.
    pub async fn save_changes(self) -> Result<usize, AppError> {
        if self.writes.is_empty() && self.outbox.is_empty() {
            return Ok(0);
        }

        let written = self.writes.len();
        let events = self.outbox.len();

        self.store
            .commit(ChangeSet {
                entities: self.writes,
                outbox: self.outbox,
            })
            .await?;

        tracing::debug!(
            correlation_id = %self.correlation_id,
            entities = written,
            outbox_messages = events,
            "Saved changes"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{DataContext, EntityBase, InMemoryStore};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Widget {
        #[serde(flatten)]
        base: EntityBase,
        name: String,
        #[serde(skip)]
        events: Vec<WidgetEvent>,
    }

    #[derive(Debug, Clone, Serialize)]
    enum WidgetEvent {
        Created { name: String },
        Renamed { name: String },
    }

    impl DomainEvent for WidgetEvent {
        fn event_type(&self) -> &'static str {
            match self {
                Self::Created { .. } => "WidgetCreated",
                Self::Renamed { .. } => "WidgetRenamed",
            }
        }
    }

    impl Entity for Widget {
        type Event = WidgetEvent;
        const KIND: &'static str = "widget";
        const TOPIC: &'static str = "widget-events";

        fn base(&self) -> &EntityBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut EntityBase {
            &mut self.base
        }

        fn take_events(&mut self) -> Vec<WidgetEvent> {
            std::mem::take(&mut self.events)
        }
    }

    impl Widget {
        fn create(name: &str) -> Self {
            Self {
                base: EntityBase::new(),
                name: name.to_string(),
                events: vec![WidgetEvent::Created { name: name.to_string() }],
            }
        }

        fn rename(&mut self, name: &str) {
            self.name = name.to_string();
            self.base.touch();
            self.events.push(WidgetEvent::Renamed { name: name.to_string() });
        }
    }

    fn context() -> (Arc<InMemoryStore>, DataContext) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), DataContext::new(store))
    }

    #[tokio::test]
    async fn test_save_writes_entity_and_outbox_together() {
        let (store, ctx) = context();
        let correlation_id = Uuid::new_v4();
        let mut widget = Widget::create("gear");

        let mut uow = ctx.begin(correlation_id);
        uow.add(&mut widget).unwrap();
        assert_eq!(uow.save_changes().await.unwrap(), 1);

        let loaded = ctx.set::<Widget>().find(widget.id()).await.unwrap().unwrap();
        assert_eq!(loaded.name, "gear");
        assert_eq!(loaded.version(), 1);

        let outbox = store.outbox_messages().await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].event_type, "WidgetCreated");
        assert_eq!(outbox[0].topic, "widget-events");
        assert_eq!(outbox[0].aggregate_type, "widget");
        assert_eq!(outbox[0].partition_key, widget.id().to_string());
        assert_eq!(outbox[0].correlation_id, correlation_id);
    }

    #[tokio::test]
    async fn test_staging_twice_merges_into_one_write() {
        let (store, ctx) = context();
        let mut widget = Widget::create("gear");

        let mut uow = ctx.begin(Uuid::new_v4());
        uow.add(&mut widget).unwrap();
        widget.rename("cog");
        uow.update(&mut widget).unwrap();

        assert_eq!(uow.staged_entities(), 1);
        assert_eq!(uow.staged_events(), 2);
        uow.save_changes().await.unwrap();

        let loaded = ctx.set::<Widget>().get(widget.id(), "Widget").await.unwrap();
        assert_eq!(loaded.name, "cog");
        assert_eq!(loaded.version(), 1);
        assert_eq!(store.outbox_messages().await.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_updates_conflict() {
        let (store, ctx) = context();
        let mut widget = Widget::create("gear");
        let mut uow = ctx.begin(Uuid::new_v4());
        uow.add(&mut widget).unwrap();
        uow.save_changes().await.unwrap();

        let repo = ctx.set::<Widget>();
        let mut first = repo.get(widget.id(), "Widget").await.unwrap();
        let mut second = repo.get(widget.id(), "Widget").await.unwrap();

        first.rename("first");
        let mut uow = ctx.begin(Uuid::new_v4());
        uow.update(&mut first).unwrap();
        uow.save_changes().await.unwrap();

        second.rename("second");
        let mut uow = ctx.begin(Uuid::new_v4());
        uow.update(&mut second).unwrap();
        let err = uow.save_changes().await.unwrap_err();
        assert!(err.is_conflict());

        let loaded = repo.get(widget.id(), "Widget").await.unwrap();
        assert_eq!(loaded.name, "first");
        assert_eq!(loaded.version(), 2);
        // The losing write's event never reached the outbox.
        assert_eq!(store.outbox_messages().await.len(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_persisted_entity() {
        let (_store, ctx) = context();
        let mut widget = Widget::create("gear");
        let mut uow = ctx.begin(Uuid::new_v4());
        uow.add(&mut widget).unwrap();
        uow.save_changes().await.unwrap();

        let mut uow = ctx.begin(Uuid::new_v4());
        assert!(uow.add(&mut widget).is_err());
    }

    #[tokio::test]
    async fn test_soft_deleted_entities_are_hidden_from_repository() {
        let (_store, ctx) = context();
        let mut widget = Widget::create("gear");
        widget.base.mark_deleted();
        let mut uow = ctx.begin(Uuid::new_v4());
        uow.add(&mut widget).unwrap();
        uow.save_changes().await.unwrap();

        let repo = ctx.set::<Widget>();
        assert!(repo.find(widget.id()).await.unwrap().is_none());
        assert!(repo.get(widget.id(), "Widget").await.unwrap_err().is_not_found());
        let hidden = repo.find_including_deleted(widget.id()).await.unwrap().unwrap();
        assert!(hidden.is_deleted());
    }

    #[tokio::test]
    async fn test_empty_unit_of_work_is_a_no_op() {
        let (_store, ctx) = context();
        let uow = ctx.begin(Uuid::new_v4());
        assert_eq!(uow.save_changes().await.unwrap(), 0);
    }
}

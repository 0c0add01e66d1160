// ============================================================================
// Persistence Layer
// ============================================================================
//
// - entity.rs        - EntityBase, Entity and DomainEvent traits
// - record.rs        - storage records, criteria, outbox and dead letters
// - store.rs         - EntityStore / OutboxStore abstractions
// - memory.rs        - in-memory store
// - postgres.rs      - sqlx/Postgres store
// - context.rs       - DataContext and typed repositories
// - unit_of_work.rs  - staged writes + transactional outbox
//
// ============================================================================

pub mod context;
pub mod entity;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;
pub mod unit_of_work;

pub use context::{DataContext, Repository};
pub use entity::{DomainEvent, Entity, EntityBase};
pub use memory::InMemoryStore;
pub use postgres::PgStore;
pub use record::{ChangeSet, Criteria, DeadLetter, EntityWrite, OutboxMessage, QueryResult, StoredRecord, UniqueKey};
pub use store::{EntityStore, OutboxStore, StoreError};
pub use unit_of_work::UnitOfWork;

// ============================================================================
// commerce_cqrs - Layered CQRS e-commerce backend
// ============================================================================
//
// Layers:
// - mediator/     - Request dispatch and pipeline behaviors
// - persistence/  - Entity store, unit of work, transactional outbox
// - cache/        - Get-or-create cache over memory or Redis
// - domain/       - Business modules (entities, commands, queries, handlers)
// - actors/       - Outbox relay, dead letter queue, health monitoring
// - messaging/    - Event publishers (Redpanda, logging, recording)
//
// ============================================================================

pub mod actors;
pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod mediator;
pub mod messaging;
pub mod metrics;
pub mod persistence;
pub mod utils;

pub use application::{AppContext, AppSettings};
pub use error::AppError;
pub use mediator::Mediator;

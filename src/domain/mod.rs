// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// One subdirectory per bounded context, each with:
// - model.rs    - entities and value objects
// - events.rs   - domain events written to the outbox
// - errors.rs   - domain error enum
// - commands.rs / queries.rs - mediator requests
// - dto.rs      - read models returned to callers
// - handlers.rs - request handlers and registration
//
// Shared guards, money and paging helpers live in `common`.
//
// ============================================================================

pub mod common;

pub mod analytics;
pub mod catalog;
pub mod content;
pub mod governance;
pub mod live_commerce;
pub mod marketplace;
pub mod notifications;
pub mod ordering;
pub mod pricing;
pub mod subscriptions;

// ============================================================================
// Content Domain - CMS pages
// ============================================================================
//
// Page lifecycle:
//   Draft ↔ Published
//   Draft | Published → Archived
//
// Published pages are served by slug from the cache.
//
// ============================================================================

pub mod commands;
pub mod dto;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod model;
pub mod queries;

pub use commands::*;
pub use dto::*;
pub use errors::*;
pub use events::*;
pub use handlers::{register, ContentHandlers};
pub use model::*;
pub use queries::*;

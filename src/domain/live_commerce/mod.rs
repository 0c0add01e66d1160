// ============================================================================
// Live Commerce Domain - seller live streams
// ============================================================================
//
// Stream lifecycle:
//   Scheduled → Live → Ended
//   Scheduled → Cancelled
//
// Products are featured before or during a stream; only a featured product
// can be pinned, and only while live.
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
pub use handlers::{register, LiveCommerceHandlers};
pub use model::*;
pub use queries::*;

// ============================================================================
// Notifications Domain - per-user inbox
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
pub use handlers::{register, NotificationHandlers};
pub use model::*;
pub use queries::*;

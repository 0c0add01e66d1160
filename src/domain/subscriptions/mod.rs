// ============================================================================
// Subscriptions Domain - recurring plans
// ============================================================================
//
// Subscription lifecycle:
//   Trialing | Active → PastDue → Active (renewal)
//   any live status   → Cancelled
//
// A cancellation scheduled for period end takes effect on the next renewal.
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
pub use handlers::{register, SubscriptionHandlers};
pub use model::*;
pub use queries::*;

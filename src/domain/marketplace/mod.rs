// ============================================================================
// Marketplace Domain - sellers and their stores
// ============================================================================
//
// Seller review flow:
//   PendingReview → Approved | Rejected
//   Approved ↔ Suspended
//
// Stores can only be opened by approved sellers.
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
pub use handlers::{register, MarketplaceHandlers};
pub use model::*;
pub use queries::*;

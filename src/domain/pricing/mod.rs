// ============================================================================
// Pricing Domain - B2B price lists
// ============================================================================
//
// A company may hold several price lists. Resolution picks the lowest
// effective unit price among its active lists valid at the requested
// instant, applying the best matching volume tier, and falls back to the
// catalog price.
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
pub use handlers::{register, PricingHandlers};
pub use model::*;
pub use queries::*;

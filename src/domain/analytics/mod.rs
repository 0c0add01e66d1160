// ============================================================================
// Analytics Domain - read-only sales reports
// ============================================================================
//
// Reports aggregate orders by `placed_at` over the half-open window
// `[from, to)`. Results are cached under the `analytics:` prefix and dropped
// whenever an order changes.
//
// ============================================================================

pub mod dto;
pub mod handlers;
pub mod queries;

pub use dto::*;
pub use handlers::{invalidate_reports, register, AnalyticsHandlers};
pub use queries::*;

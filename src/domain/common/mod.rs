// ============================================================================
// Shared Domain Building Blocks
// ============================================================================

pub mod guard;
pub mod pagination;

pub use guard::GuardError;
pub use pagination::{PageRequest, PagedResult};

/// Monetary amounts are kept in minor units (cents).
pub type Cents = i64;

/// Apply a percentage discount, rounding to the nearest cent.
pub fn apply_discount(amount: Cents, discount_percent: f64) -> Cents {
    let factor = (100.0 - discount_percent.clamp(0.0, 100.0)) / 100.0;
    (amount as f64 * factor).round() as Cents
}

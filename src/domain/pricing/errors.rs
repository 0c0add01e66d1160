use uuid::Uuid;

use crate::domain::common::GuardError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("Volume tiers must have distinct minimum quantities ({0} repeats)")]
    DuplicateTier(i32),

    #[error("Price list has no entry for product {0}")]
    EntryNotFound(Uuid),

    #[error("Cannot activate a price list without entries")]
    NoEntries,

    #[error("Currency must be a three-letter ISO code: {0}")]
    InvalidCurrency(String),
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::Guard(guard) => guard.into(),
            other => AppError::BusinessRule(other.to_string()),
        }
    }
}

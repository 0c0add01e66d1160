use crate::domain::common::GuardError;
use crate::error::AppError;
use super::model::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("Order is already cancelled")]
    AlreadyCancelled,

    #[error("Order must be confirmed before shipping")]
    NotConfirmed,

    #[error("Order must be shipped before delivery")]
    NotShipped,

    #[error("Cannot {action} an order in status {status:?}")]
    InvalidStatusTransition {
        action: &'static str,
        status: OrderStatus,
    },

    #[error("Order items cannot be empty")]
    EmptyItems,
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Guard(guard) => guard.into(),
            other => AppError::BusinessRule(other.to_string()),
        }
    }
}

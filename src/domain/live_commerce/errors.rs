use uuid::Uuid;

use crate::domain::common::GuardError;
use crate::error::AppError;
use super::model::LiveStreamStatus;

#[derive(Debug, thiserror::Error)]
pub enum LiveCommerceError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("Cannot {action} a stream in status {status:?}")]
    InvalidStatusTransition {
        action: &'static str,
        status: LiveStreamStatus,
    },

    #[error("Stream must be scheduled in the future")]
    ScheduledInPast,

    #[error("Product {0} is not featured in this stream")]
    ProductNotFeatured(Uuid),

    #[error("A stream can feature at most {0} products")]
    TooManyFeatured(usize),

    #[error("Product {0} does not belong to the stream's seller")]
    ProductNotOwned(Uuid),
}

impl From<LiveCommerceError> for AppError {
    fn from(err: LiveCommerceError) -> Self {
        match err {
            LiveCommerceError::Guard(guard) => guard.into(),
            other => AppError::BusinessRule(other.to_string()),
        }
    }
}

use uuid::Uuid;

use crate::domain::common::GuardError;
use crate::error::AppError;
use super::model::SellerStatus;

#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("User {0} already has a seller account")]
    SellerAlreadyRegistered(Uuid),

    #[error("Cannot {action} a seller in status {status:?}")]
    InvalidStatusTransition {
        action: &'static str,
        status: SellerStatus,
    },

    #[error("Seller must be approved to open a store")]
    SellerNotApproved,

    #[error("A store with slug '{0}' already exists")]
    DuplicateStoreSlug(String),
}

impl From<MarketplaceError> for AppError {
    fn from(err: MarketplaceError) -> Self {
        match err {
            MarketplaceError::Guard(guard) => guard.into(),
            other => AppError::BusinessRule(other.to_string()),
        }
    }
}

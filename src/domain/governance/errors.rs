use uuid::Uuid;

use crate::domain::common::GuardError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("Policy {0} is not active")]
    PolicyNotActive(Uuid),
}

impl From<GovernanceError> for AppError {
    fn from(err: GovernanceError) -> Self {
        match err {
            GovernanceError::Guard(guard) => guard.into(),
            other => AppError::BusinessRule(other.to_string()),
        }
    }
}

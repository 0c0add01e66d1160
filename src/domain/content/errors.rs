use crate::domain::common::GuardError;
use crate::error::AppError;
use super::model::PageStatus;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("A page with slug '{0}' already exists")]
    DuplicateSlug(String),

    #[error("Cannot {action} a page in status {status:?}")]
    InvalidStatusTransition {
        action: &'static str,
        status: PageStatus,
    },
}

impl From<ContentError> for AppError {
    fn from(err: ContentError) -> Self {
        match err {
            ContentError::Guard(guard) => guard.into(),
            other => AppError::BusinessRule(other.to_string()),
        }
    }
}

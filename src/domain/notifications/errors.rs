use crate::domain::common::GuardError;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error(transparent)]
    Guard(#[from] GuardError),
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Guard(guard) => guard.into(),
        }
    }
}

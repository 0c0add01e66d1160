use std::fmt::Display;

use crate::domain::common::GuardError;
use crate::mediator::{FieldError, ValidationErrors};
use crate::persistence::StoreError;
use crate::utils::IsTransient;

// ============================================================================
// Application Error - returned by every request handler
// ============================================================================
//
// Domain modules keep their own business error enums; they collapse into
// `BusinessRule` with the user-facing message when crossing the handler
// boundary.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{entity} {id} was not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    BusinessRule(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Concurrency conflict: {0}")]
    Conflict(String),

    #[error("No handler registered for request {0}")]
    HandlerNotRegistered(&'static str),

    #[error("Persistence failure: {0}")]
    Store(StoreError),

    #[error("Serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn business(message: impl Into<String>) -> Self {
        Self::BusinessRule(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Expected outcomes (bad input, missing rows, rule violations) as opposed
    /// to infrastructure failures.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::BusinessRule(_) | Self::Validation(_) | Self::Conflict(_)
        )
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::BusinessRule(_) => "business_rule",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::HandlerNotRegistered(_) => "unregistered",
            Self::Store(_) => "store",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { .. } => Self::Conflict(err.to_string()),
            StoreError::Duplicate { .. } => Self::BusinessRule(err.to_string()),
            other => Self::Store(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// A guard tripped inside a handler reports the same way as a validator.
impl From<GuardError> for AppError {
    fn from(err: GuardError) -> Self {
        Self::Validation(ValidationErrors {
            errors: vec![FieldError {
                field: err.field().to_string(),
                message: err.to_string(),
            }],
        })
    }
}

impl IsTransient for AppError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

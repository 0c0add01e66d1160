use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::GuardError;

// ============================================================================
// Requests - Commands and Queries
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Command,
    Query,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Query => "query",
        }
    }
}

/// A typed request routed by the mediator to exactly one handler.
pub trait Request: Validate + Send + Sync + 'static {
    type Response: Send + 'static;

    const NAME: &'static str;
    const KIND: RequestKind;

    /// `Mediator::send` re-runs the request on an optimistic-concurrency
    /// conflict when the mediator has a conflict retry policy.
    const RETRY_ON_CONFLICT: bool = false;
}

/// Implements `Request` for a command or query type:
/// `request!(UpdateProduct => ProductDto, Command);`
/// `request!(PlaceOrder => OrderDto, Command, retry_on_conflict);`
#[macro_export]
macro_rules! request {
    ($name:ident => $response:ty, $kind:ident) => {
        impl $crate::mediator::Request for $name {
            type Response = $response;
            const NAME: &'static str = stringify!($name);
            const KIND: $crate::mediator::RequestKind = $crate::mediator::RequestKind::$kind;
        }
    };
    ($name:ident => $response:ty, $kind:ident, retry_on_conflict) => {
        impl $crate::mediator::Request for $name {
            type Response = $response;
            const NAME: &'static str = stringify!($name);
            const KIND: $crate::mediator::RequestKind = $crate::mediator::RequestKind::$kind;
            const RETRY_ON_CONFLICT: bool = true;
        }
    };
}

/// Metadata travelling with a request through the pipeline.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub name: &'static str,
    pub kind: RequestKind,
    pub correlation_id: Uuid,
    pub user_id: Option<Uuid>,
}

impl RequestMeta {
    pub fn for_request<R: Request>() -> Self {
        Self {
            name: R::NAME,
            kind: R::KIND,
            correlation_id: Uuid::new_v4(),
            user_id: None,
        }
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Accumulates failures instead of stopping at the first one.
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guard<T>(&mut self, result: Result<T, GuardError>) -> &mut Self {
        if let Err(err) = result {
            self.errors.errors.push(FieldError {
                field: err.field().to_string(),
                message: err.to_string(),
            });
        }
        self
    }

    pub fn check(&mut self, condition: bool, field: &str, message: impl Into<String>) -> &mut Self {
        if !condition {
            self.errors.errors.push(FieldError {
                field: field.to_string(),
                message: message.into(),
            });
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::common::guard;

    #[test]
    fn test_validator_collects_all_errors() {
        let result = Validator::new()
            .guard(guard::not_nil(Uuid::nil(), "customer_id"))
            .guard(guard::positive(0, "quantity"))
            .check(true, "ignored", "never reported")
            .finish();

        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.has_field("customer_id"));
        assert!(errors.has_field("quantity"));
        assert!(!errors.has_field("ignored"));
    }

    #[test]
    fn test_validator_passes() {
        assert!(Validator::new()
            .guard(guard::not_empty("ok", "name"))
            .finish()
            .is_ok());
    }

    #[test]
    fn test_validation_errors_display() {
        let errors = Validator::new()
            .check(false, "slug", "slug is taken")
            .finish()
            .unwrap_err();
        assert_eq!(errors.to_string(), "slug: slug is taken");
    }
}

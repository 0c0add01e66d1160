use uuid::Uuid;

use crate::domain::common::GuardError;
use crate::error::AppError;
use super::model::SubscriptionStatus;

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("Plan {0} is retired and accepts no new subscriptions")]
    PlanRetired(Uuid),

    #[error("Customer {customer_id} already has a live subscription to plan {plan_id}")]
    AlreadySubscribed { customer_id: Uuid, plan_id: Uuid },

    #[error("Cannot {action} a subscription in status {status:?}")]
    InvalidStatusTransition {
        action: &'static str,
        status: SubscriptionStatus,
    },
}

impl From<SubscriptionError> for AppError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::Guard(guard) => guard.into(),
            other => AppError::BusinessRule(other.to_string()),
        }
    }
}

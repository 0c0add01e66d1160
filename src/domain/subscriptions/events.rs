use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::common::Cents;
use crate::persistence::DomainEvent;
use super::model::BillingInterval;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum PlanEvent {
    PlanCreated {
        plan_id: Uuid,
        name: String,
        price: Cents,
        interval: BillingInterval,
    },
    PlanRetired {
        plan_id: Uuid,
    },
}

impl DomainEvent for PlanEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::PlanCreated { .. } => "PlanCreated",
            Self::PlanRetired { .. } => "PlanRetired",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SubscriptionEvent {
    SubscriptionStarted {
        subscription_id: Uuid,
        customer_id: Uuid,
        plan_id: Uuid,
        trial_ends_at: Option<DateTime<Utc>>,
    },
    SubscriptionRenewed {
        subscription_id: Uuid,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    },
    SubscriptionPastDue {
        subscription_id: Uuid,
    },
    SubscriptionCancellationScheduled {
        subscription_id: Uuid,
        effective_at: DateTime<Utc>,
    },
    SubscriptionCancelled {
        subscription_id: Uuid,
    },
}

impl DomainEvent for SubscriptionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::SubscriptionStarted { .. } => "SubscriptionStarted",
            Self::SubscriptionRenewed { .. } => "SubscriptionRenewed",
            Self::SubscriptionPastDue { .. } => "SubscriptionPastDue",
            Self::SubscriptionCancellationScheduled { .. } => "SubscriptionCancellationScheduled",
            Self::SubscriptionCancelled { .. } => "SubscriptionCancelled",
        }
    }
}

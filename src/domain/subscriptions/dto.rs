use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Cents;
use super::model::{BillingInterval, Subscription, SubscriptionPlan, SubscriptionStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDto {
    pub id: Uuid,
    pub name: String,
    pub price: Cents,
    pub interval: BillingInterval,
    pub trial_days: u32,
    pub is_active: bool,
}

impl From<&SubscriptionPlan> for PlanDto {
    fn from(p: &SubscriptionPlan) -> Self {
        Self {
            id: p.base.id,
            name: p.name.clone(),
            price: p.price,
            interval: p.interval,
            trial_days: p.trial_days,
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionDto {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub started_at: DateTime<Utc>,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<&Subscription> for SubscriptionDto {
    fn from(s: &Subscription) -> Self {
        Self {
            id: s.base.id,
            customer_id: s.customer_id,
            plan_id: s.plan_id,
            status: s.status,
            started_at: s.started_at,
            current_period_start: s.current_period_start,
            current_period_end: s.current_period_end,
            trial_ends_at: s.trial_ends_at,
            cancel_at_period_end: s.cancel_at_period_end,
            cancelled_at: s.cancelled_at,
        }
    }
}

use uuid::Uuid;

use crate::domain::common::{guard, Cents};
use crate::mediator::{Validate, ValidationErrors, Validator};
use crate::request;
use super::dto::{PlanDto, SubscriptionDto};
use super::model::{BillingInterval, NAME_MAX, TRIAL_DAYS_MAX};

// ============================================================================
// Subscription Commands
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreatePlan {
    pub name: String,
    pub price: Cents,
    pub interval: BillingInterval,
    pub trial_days: u32,
}

request!(CreatePlan => PlanDto, Command);

impl Validate for CreatePlan {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::text(&self.name, NAME_MAX, "name"))
            .guard(guard::non_negative(self.price, "price"))
            .guard(guard::in_range(self.trial_days, 0, TRIAL_DAYS_MAX, "trial_days"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RetirePlan {
    pub plan_id: Uuid,
}

request!(RetirePlan => PlanDto, Command);

impl Validate for RetirePlan {}

#[derive(Debug, Clone)]
pub struct Subscribe {
    pub customer_id: Uuid,
    pub plan_id: Uuid,
}

request!(Subscribe => SubscriptionDto, Command);

impl Validate for Subscribe {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.customer_id, "customer_id"))
            .guard(guard::not_nil(self.plan_id, "plan_id"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CancelSubscription {
    pub subscription_id: Uuid,
    pub at_period_end: bool,
}

request!(CancelSubscription => SubscriptionDto, Command);

impl Validate for CancelSubscription {}

#[derive(Debug, Clone)]
pub struct RenewSubscription {
    pub subscription_id: Uuid,
}

request!(RenewSubscription => SubscriptionDto, Command);

impl Validate for RenewSubscription {}

#[derive(Debug, Clone)]
pub struct MarkSubscriptionPastDue {
    pub subscription_id: Uuid,
}

request!(MarkSubscriptionPastDue => SubscriptionDto, Command);

impl Validate for MarkSubscriptionPastDue {}

use uuid::Uuid;

use crate::mediator::Validate;
use crate::request;
use super::dto::{PlanDto, SubscriptionDto};

#[derive(Debug, Clone)]
pub struct GetSubscription {
    pub subscription_id: Uuid,
}

request!(GetSubscription => Option<SubscriptionDto>, Query);

impl Validate for GetSubscription {}

#[derive(Debug, Clone)]
pub struct ListCustomerSubscriptions {
    pub customer_id: Uuid,
    pub include_cancelled: bool,
}

request!(ListCustomerSubscriptions => Vec<SubscriptionDto>, Query);

impl Validate for ListCustomerSubscriptions {}

#[derive(Debug, Clone, Default)]
pub struct ListPlans {
    pub active_only: bool,
}

request!(ListPlans => Vec<PlanDto>, Query);

impl Validate for ListPlans {}

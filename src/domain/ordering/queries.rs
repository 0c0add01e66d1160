use uuid::Uuid;

use crate::domain::common::{guard, PageRequest, PagedResult};
use crate::mediator::{Validate, ValidationErrors, Validator};
use crate::request;
use super::dto::OrderDto;
use super::model::OrderStatus;

#[derive(Debug, Clone)]
pub struct GetOrderById {
    pub order_id: Uuid,
}

request!(GetOrderById => Option<OrderDto>, Query);

impl Validate for GetOrderById {}

/// Newest first.
#[derive(Debug, Clone)]
pub struct ListCustomerOrders {
    pub customer_id: Uuid,
    pub status: Option<OrderStatus>,
    pub page: Option<PageRequest>,
}

request!(ListCustomerOrders => PagedResult<OrderDto>, Query);

impl Validate for ListCustomerOrders {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.customer_id, "customer_id"))
            .finish()
    }
}

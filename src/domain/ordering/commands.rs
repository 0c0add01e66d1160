use uuid::Uuid;

use crate::domain::common::guard;
use crate::mediator::{Validate, ValidationErrors, Validator};
use crate::request;
use super::dto::OrderDto;
use super::model::{Address, REASON_MAX, TRACKING_MAX};

// ============================================================================
// Order Commands
// ============================================================================

#[derive(Debug, Clone)]
pub struct PlaceOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Prices come from the catalog; stock is reserved in the same commit.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: Uuid,
    pub items: Vec<PlaceOrderItem>,
    pub shipping_address: Address,
}

request!(PlaceOrder => OrderDto, Command, retry_on_conflict);

impl Validate for PlaceOrder {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.guard(guard::not_nil(self.customer_id, "customer_id"))
            .check(!self.items.is_empty(), "items", "at least one item is required")
            .guard(self.shipping_address.validate());
        for item in &self.items {
            v.guard(guard::not_nil(item.product_id, "product_id"))
                .guard(guard::positive(item.quantity, "quantity"));
        }
        v.finish()
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmOrder {
    pub order_id: Uuid,
}

request!(ConfirmOrder => OrderDto, Command);

impl Validate for ConfirmOrder {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.order_id, "order_id"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ShipOrder {
    pub order_id: Uuid,
    pub tracking_number: String,
    pub carrier: String,
}

request!(ShipOrder => OrderDto, Command);

impl Validate for ShipOrder {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.order_id, "order_id"))
            .guard(guard::text(&self.tracking_number, TRACKING_MAX, "tracking_number"))
            .guard(guard::text(&self.carrier, TRACKING_MAX, "carrier"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DeliverOrder {
    pub order_id: Uuid,
}

request!(DeliverOrder => OrderDto, Command);

impl Validate for DeliverOrder {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.order_id, "order_id"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CancelOrder {
    pub order_id: Uuid,
    pub reason: String,
}

request!(CancelOrder => OrderDto, Command, retry_on_conflict);

impl Validate for CancelOrder {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.order_id, "order_id"))
            .guard(guard::text(&self.reason, REASON_MAX, "reason"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DeleteOrder {
    pub order_id: Uuid,
}

request!(DeleteOrder => bool, Command);

impl Validate for DeleteOrder {}

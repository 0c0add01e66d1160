use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Cents;
use super::model::{Address, Order, OrderItem, OrderStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemDto {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Cents,
    pub line_total: Cents,
}

impl From<&OrderItem> for OrderItemDto {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub items: Vec<OrderItemDto>,
    pub total: Cents,
    pub shipping_address: Address,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub cancellation_reason: Option<String>,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderDto {
    fn from(order: &Order) -> Self {
        Self {
            id: order.base.id,
            customer_id: order.customer_id,
            status: order.status,
            items: order.items.iter().map(OrderItemDto::from).collect(),
            total: order.total,
            shipping_address: order.shipping_address.clone(),
            tracking_number: order.tracking_number.clone(),
            carrier: order.carrier.clone(),
            cancellation_reason: order.cancellation_reason.clone(),
            placed_at: order.placed_at,
            updated_at: order.base.updated_at,
        }
    }
}

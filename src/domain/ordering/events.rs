use serde::Serialize;
use uuid::Uuid;

use crate::domain::common::Cents;
use crate::persistence::DomainEvent;
use super::model::OrderItem;

// ============================================================================
// Order Events
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum OrderEvent {
    OrderPlaced {
        order_id: Uuid,
        customer_id: Uuid,
        items: Vec<OrderItem>,
        total: Cents,
    },
    OrderConfirmed {
        order_id: Uuid,
    },
    OrderShipped {
        order_id: Uuid,
        tracking_number: String,
        carrier: String,
    },
    OrderDelivered {
        order_id: Uuid,
    },
    OrderCancelled {
        order_id: Uuid,
        reason: String,
    },
    OrderDeleted {
        order_id: Uuid,
    },
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => "OrderPlaced",
            Self::OrderConfirmed { .. } => "OrderConfirmed",
            Self::OrderShipped { .. } => "OrderShipped",
            Self::OrderDelivered { .. } => "OrderDelivered",
            Self::OrderCancelled { .. } => "OrderCancelled",
            Self::OrderDeleted { .. } => "OrderDeleted",
        }
    }
}

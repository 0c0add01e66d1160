use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{guard, Cents, GuardError};
use crate::persistence::{Entity, EntityBase};
use super::errors::OrderError;
use super::events::OrderEvent;

pub const TRACKING_MAX: usize = 100;
pub const REASON_MAX: usize = 500;

// ============================================================================
// Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

/// Line item; price and seller are captured from the catalog at placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub seller_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Cents,
}

impl OrderItem {
    pub fn new(
        product_id: Uuid,
        seller_id: Uuid,
        product_name: &str,
        quantity: i32,
        unit_price: Cents,
    ) -> Result<Self, GuardError> {
        guard::line_total(unit_price, quantity, "items")?;
        Ok(Self {
            product_id: guard::not_nil(product_id, "product_id")?,
            seller_id,
            product_name: product_name.to_string(),
            quantity: guard::positive(quantity, "quantity")?,
            unit_price: guard::non_negative(unit_price, "unit_price")?,
        })
    }

    /// Saturates; `new` already rejects lines that overflow.
    pub fn line_total(&self) -> Cents {
        self.unit_price.saturating_mul(Cents::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    pub fn validate(&self) -> Result<(), GuardError> {
        guard::text(&self.street, 200, "shipping_address.street")?;
        guard::text(&self.city, 100, "shipping_address.city")?;
        guard::text(&self.postal_code, 20, "shipping_address.postal_code")?;
        guard::text(&self.country, 2, "shipping_address.country")?;
        Ok(())
    }
}

// ============================================================================
// Order Entity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(flatten)]
    pub base: EntityBase,
    pub customer_id: Uuid,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub total: Cents,
    pub shipping_address: Address,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub cancellation_reason: Option<String>,
    pub placed_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    events: Vec<OrderEvent>,
}

impl Order {
    pub fn place(
        customer_id: Uuid,
        items: Vec<OrderItem>,
        shipping_address: Address,
    ) -> Result<Self, OrderError> {
        guard::not_nil(customer_id, "customer_id")?;
        if items.is_empty() {
            return Err(OrderError::EmptyItems);
        }
        for item in &items {
            guard::positive(item.quantity, "quantity")?;
            guard::non_negative(item.unit_price, "unit_price")?;
        }
        shipping_address.validate()?;

        let base = EntityBase::new();
        let total = guard::checked_sum(items.iter().map(OrderItem::line_total), "items")?;
        let events = vec![OrderEvent::OrderPlaced {
            order_id: base.id,
            customer_id,
            items: items.clone(),
            total,
        }];

        Ok(Self {
            placed_at: base.created_at,
            base,
            customer_id,
            items,
            status: OrderStatus::Pending,
            total,
            shipping_address,
            tracking_number: None,
            carrier: None,
            cancellation_reason: None,
            confirmed_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            events,
        })
    }

    pub fn item_count(&self) -> i32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn confirm(&mut self) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Pending => {}
            OrderStatus::Confirmed => return Ok(()),
            OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
            status => {
                return Err(OrderError::InvalidStatusTransition {
                    action: "confirm",
                    status,
                })
            }
        }

        self.status = OrderStatus::Confirmed;
        self.confirmed_at = Some(Utc::now());
        self.base.touch();
        self.events.push(OrderEvent::OrderConfirmed {
            order_id: self.base.id,
        });
        Ok(())
    }

    pub fn ship(&mut self, tracking_number: &str, carrier: &str) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Confirmed => {}
            OrderStatus::Shipped => return Ok(()),
            OrderStatus::Pending => return Err(OrderError::NotConfirmed),
            OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
            status => {
                return Err(OrderError::InvalidStatusTransition {
                    action: "ship",
                    status,
                })
            }
        }

        let tracking_number = guard::text(tracking_number, TRACKING_MAX, "tracking_number")?;
        let carrier = guard::text(carrier, TRACKING_MAX, "carrier")?;

        self.status = OrderStatus::Shipped;
        self.tracking_number = Some(tracking_number.clone());
        self.carrier = Some(carrier.clone());
        self.shipped_at = Some(Utc::now());
        self.base.touch();
        self.events.push(OrderEvent::OrderShipped {
            order_id: self.base.id,
            tracking_number,
            carrier,
        });
        Ok(())
    }

    pub fn deliver(&mut self) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Shipped => {}
            OrderStatus::Delivered => return Ok(()),
            OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
            _ => return Err(OrderError::NotShipped),
        }

        self.status = OrderStatus::Delivered;
        self.delivered_at = Some(Utc::now());
        self.base.touch();
        self.events.push(OrderEvent::OrderDelivered {
            order_id: self.base.id,
        });
        Ok(())
    }

    /// Returns false when the order was already cancelled.
    pub fn cancel(&mut self, reason: &str) -> Result<bool, OrderError> {
        if self.status == OrderStatus::Cancelled {
            return Ok(false);
        }
        if !self.status.is_cancellable() {
            return Err(OrderError::InvalidStatusTransition {
                action: "cancel",
                status: self.status,
            });
        }
        let reason = guard::text(reason, REASON_MAX, "reason")?;

        self.status = OrderStatus::Cancelled;
        self.cancellation_reason = Some(reason.clone());
        self.cancelled_at = Some(Utc::now());
        self.base.touch();
        self.events.push(OrderEvent::OrderCancelled {
            order_id: self.base.id,
            reason,
        });
        Ok(true)
    }

    pub fn mark_as_deleted(&mut self) -> bool {
        if !self.base.mark_deleted() {
            return false;
        }
        self.events.push(OrderEvent::OrderDeleted {
            order_id: self.base.id,
        });
        true
    }
}

impl Entity for Order {
    type Event = OrderEvent;
    const KIND: &'static str = "order";
    const TOPIC: &'static str = "order-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<OrderEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            postal_code: "12345".to_string(),
            country: "US".to_string(),
        }
    }

    fn order() -> Order {
        let items = vec![
            OrderItem::new(Uuid::new_v4(), Uuid::new_v4(), "Lamp", 2, 1_500).unwrap(),
            OrderItem::new(Uuid::new_v4(), Uuid::new_v4(), "Bulb", 3, 200).unwrap(),
        ];
        Order::place(Uuid::new_v4(), items, address()).unwrap()
    }

    #[test]
    fn test_place_computes_total() {
        let mut order = order();
        assert_eq!(order.total, 3_600);
        assert_eq!(order.item_count(), 5);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.take_events().len(), 1);
    }

    #[test]
    fn test_totals_that_overflow_are_rejected() {
        let err = OrderItem::new(Uuid::new_v4(), Uuid::new_v4(), "Yacht", 3, Cents::MAX / 2).unwrap_err();
        assert_eq!(err, GuardError::Overflow("items"));

        let items = vec![
            OrderItem::new(Uuid::new_v4(), Uuid::new_v4(), "Yacht", 1, Cents::MAX).unwrap(),
            OrderItem::new(Uuid::new_v4(), Uuid::new_v4(), "Dinghy", 1, 1).unwrap(),
        ];
        let err = Order::place(Uuid::new_v4(), items, address()).unwrap_err();
        assert!(matches!(err, OrderError::Guard(GuardError::Overflow("items"))));
    }

    #[test]
    fn test_place_requires_items() {
        let result = Order::place(Uuid::new_v4(), Vec::new(), address());
        assert!(matches!(result, Err(OrderError::EmptyItems)));
    }

    #[test]
    fn test_item_guards() {
        assert!(OrderItem::new(Uuid::new_v4(), Uuid::new_v4(), "x", 0, 100).is_err());
        assert!(OrderItem::new(Uuid::new_v4(), Uuid::new_v4(), "x", 1, -1).is_err());
        assert!(OrderItem::new(Uuid::nil(), Uuid::new_v4(), "x", 1, 1).is_err());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut order = order();
        order.confirm().unwrap();
        order.ship("TRACK-1", "UPS").unwrap();
        order.deliver().unwrap();

        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.tracking_number.as_deref(), Some("TRACK-1"));
        assert!(order.delivered_at.is_some());
        assert_eq!(order.take_events().len(), 4);
    }

    #[test]
    fn test_transitions_are_idempotent() {
        let mut order = order();
        order.take_events();

        order.confirm().unwrap();
        order.confirm().unwrap();
        assert_eq!(order.take_events().len(), 1);

        assert!(order.cancel("changed mind").unwrap());
        assert!(!order.cancel("again").unwrap());
        assert_eq!(order.take_events().len(), 1);
        assert_eq!(order.cancellation_reason.as_deref(), Some("changed mind"));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut order = order();
        assert!(matches!(order.ship("T", "C"), Err(OrderError::NotConfirmed)));
        assert!(matches!(order.deliver(), Err(OrderError::NotShipped)));

        order.confirm().unwrap();
        order.ship("T", "C").unwrap();
        assert!(matches!(
            order.cancel("late"),
            Err(OrderError::InvalidStatusTransition { action: "cancel", .. })
        ));

        let mut cancelled = self::order();
        cancelled.cancel("x").unwrap();
        assert!(matches!(cancelled.confirm(), Err(OrderError::AlreadyCancelled)));
    }
}

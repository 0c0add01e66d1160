use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::common::Cents;
use crate::persistence::DomainEvent;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum PriceListEvent {
    PriceListCreated {
        price_list_id: Uuid,
        company_id: Uuid,
        currency: String,
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    },
    PriceListEntrySet {
        price_list_id: Uuid,
        product_id: Uuid,
        unit_price: Cents,
        tier_count: usize,
    },
    PriceListEntryRemoved {
        price_list_id: Uuid,
        product_id: Uuid,
    },
    PriceListActivated {
        price_list_id: Uuid,
    },
    PriceListDeactivated {
        price_list_id: Uuid,
    },
}

impl DomainEvent for PriceListEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::PriceListCreated { .. } => "PriceListCreated",
            Self::PriceListEntrySet { .. } => "PriceListEntrySet",
            Self::PriceListEntryRemoved { .. } => "PriceListEntryRemoved",
            Self::PriceListActivated { .. } => "PriceListActivated",
            Self::PriceListDeactivated { .. } => "PriceListDeactivated",
        }
    }
}

use serde::Serialize;
use uuid::Uuid;

use crate::persistence::DomainEvent;

// ============================================================================
// Marketplace Events
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SellerEvent {
    SellerRegistered {
        seller_id: Uuid,
        owner_user_id: Uuid,
        business_name: String,
    },
    SellerApproved {
        seller_id: Uuid,
        commission_rate: f64,
    },
    SellerRejected {
        seller_id: Uuid,
        reason: String,
    },
    SellerSuspended {
        seller_id: Uuid,
        reason: String,
    },
    SellerReinstated {
        seller_id: Uuid,
    },
    SellerDeleted {
        seller_id: Uuid,
    },
}

impl DomainEvent for SellerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::SellerRegistered { .. } => "SellerRegistered",
            Self::SellerApproved { .. } => "SellerApproved",
            Self::SellerRejected { .. } => "SellerRejected",
            Self::SellerSuspended { .. } => "SellerSuspended",
            Self::SellerReinstated { .. } => "SellerReinstated",
            Self::SellerDeleted { .. } => "SellerDeleted",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    StoreOpened {
        store_id: Uuid,
        seller_id: Uuid,
        slug: String,
    },
    StoreClosed {
        store_id: Uuid,
    },
}

impl DomainEvent for StoreEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::StoreOpened { .. } => "StoreOpened",
            Self::StoreClosed { .. } => "StoreClosed",
        }
    }
}

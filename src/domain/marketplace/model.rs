use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::guard;
use crate::persistence::{Entity, EntityBase, UniqueKey};
use super::errors::MarketplaceError;
use super::events::{SellerEvent, StoreEvent};

pub const BUSINESS_NAME_MAX: usize = 200;
pub const REASON_MAX: usize = 500;
pub const STORE_SLUG_MAX: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SellerStatus {
    PendingReview,
    Approved,
    Rejected,
    Suspended,
}

// ============================================================================
// Seller
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seller {
    #[serde(flatten)]
    pub base: EntityBase,
    pub owner_user_id: Uuid,
    pub business_name: String,
    pub contact_email: String,
    pub status: SellerStatus,
    /// Percent of each sale kept by the marketplace.
    pub commission_rate: f64,
    pub rejection_reason: Option<String>,
    pub suspension_reason: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    events: Vec<SellerEvent>,
}

impl Seller {
    pub fn register(
        owner_user_id: Uuid,
        business_name: &str,
        contact_email: &str,
    ) -> Result<Self, MarketplaceError> {
        let owner_user_id = guard::not_nil(owner_user_id, "owner_user_id")?;
        let business_name = guard::text(business_name, BUSINESS_NAME_MAX, "business_name")?;
        let contact_email = guard::email(contact_email, "contact_email")?;

        let base = EntityBase::new();
        let events = vec![SellerEvent::SellerRegistered {
            seller_id: base.id,
            owner_user_id,
            business_name: business_name.clone(),
        }];

        Ok(Self {
            base,
            owner_user_id,
            business_name,
            contact_email,
            status: SellerStatus::PendingReview,
            commission_rate: 0.0,
            rejection_reason: None,
            suspension_reason: None,
            approved_at: None,
            events,
        })
    }

    pub fn approve(&mut self, commission_rate: f64) -> Result<(), MarketplaceError> {
        match self.status {
            SellerStatus::PendingReview => {}
            SellerStatus::Approved => return Ok(()),
            status => return Err(transition("approve", status)),
        }
        let commission_rate = guard::in_range(commission_rate, 0.0, 100.0, "commission_rate")?;

        self.status = SellerStatus::Approved;
        self.commission_rate = commission_rate;
        self.rejection_reason = None;
        self.approved_at = Some(Utc::now());
        self.base.touch();
        self.events.push(SellerEvent::SellerApproved {
            seller_id: self.base.id,
            commission_rate,
        });
        Ok(())
    }

    pub fn reject(&mut self, reason: &str) -> Result<(), MarketplaceError> {
        match self.status {
            SellerStatus::PendingReview => {}
            SellerStatus::Rejected => return Ok(()),
            status => return Err(transition("reject", status)),
        }
        let reason = guard::text(reason, REASON_MAX, "reason")?;

        self.status = SellerStatus::Rejected;
        self.rejection_reason = Some(reason.clone());
        self.base.touch();
        self.events.push(SellerEvent::SellerRejected {
            seller_id: self.base.id,
            reason,
        });
        Ok(())
    }

    pub fn suspend(&mut self, reason: &str) -> Result<(), MarketplaceError> {
        match self.status {
            SellerStatus::Approved => {}
            SellerStatus::Suspended => return Ok(()),
            status => return Err(transition("suspend", status)),
        }
        let reason = guard::text(reason, REASON_MAX, "reason")?;

        self.status = SellerStatus::Suspended;
        self.suspension_reason = Some(reason.clone());
        self.base.touch();
        self.events.push(SellerEvent::SellerSuspended {
            seller_id: self.base.id,
            reason,
        });
        Ok(())
    }

    pub fn reinstate(&mut self) -> Result<(), MarketplaceError> {
        match self.status {
            SellerStatus::Suspended => {}
            SellerStatus::Approved => return Ok(()),
            status => return Err(transition("reinstate", status)),
        }

        self.status = SellerStatus::Approved;
        self.suspension_reason = None;
        self.base.touch();
        self.events.push(SellerEvent::SellerReinstated {
            seller_id: self.base.id,
        });
        Ok(())
    }

    pub fn is_approved(&self) -> bool {
        self.status == SellerStatus::Approved
    }

    pub fn mark_as_deleted(&mut self) -> bool {
        if !self.base.mark_deleted() {
            return false;
        }
        self.events.push(SellerEvent::SellerDeleted {
            seller_id: self.base.id,
        });
        true
    }
}

fn transition(action: &'static str, status: SellerStatus) -> MarketplaceError {
    MarketplaceError::InvalidStatusTransition { action, status }
}

impl Entity for Seller {
    type Event = SellerEvent;
    const KIND: &'static str = "seller";
    const TOPIC: &'static str = "marketplace-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<SellerEvent> {
        std::mem::take(&mut self.events)
    }
}

// ============================================================================
// Store
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    #[serde(flatten)]
    pub base: EntityBase,
    pub seller_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(skip)]
    events: Vec<StoreEvent>,
}

impl Store {
    /// Only approved sellers may open stores.
    pub fn open(
        seller: &Seller,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Self, MarketplaceError> {
        if !seller.is_approved() {
            return Err(MarketplaceError::SellerNotApproved);
        }
        let name = guard::text(name, BUSINESS_NAME_MAX, "name")?;
        let slug = guard::slug(slug, STORE_SLUG_MAX, "slug")?;
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let base = EntityBase::new();
        let events = vec![StoreEvent::StoreOpened {
            store_id: base.id,
            seller_id: seller.base.id,
            slug: slug.clone(),
        }];

        Ok(Self {
            base,
            seller_id: seller.base.id,
            name,
            slug,
            description,
            is_active: true,
            events,
        })
    }

    pub fn close(&mut self) {
        if !self.is_active {
            return;
        }
        self.is_active = false;
        self.base.touch();
        self.events.push(StoreEvent::StoreClosed {
            store_id: self.base.id,
        });
    }
}

impl Entity for Store {
    type Event = StoreEvent;
    const KIND: &'static str = "store";
    const TOPIC: &'static str = "marketplace-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.events)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("slug", self.slug.as_str())]
    }
}

use uuid::Uuid;

use crate::domain::common::guard;
use crate::mediator::{Validate, ValidationErrors, Validator};
use crate::request;
use super::dto::{SellerDto, StoreDto};
use super::model::{BUSINESS_NAME_MAX, REASON_MAX, STORE_SLUG_MAX};

// ============================================================================
// Marketplace Commands
// ============================================================================

#[derive(Debug, Clone)]
pub struct RegisterSeller {
    pub owner_user_id: Uuid,
    pub business_name: String,
    pub contact_email: String,
}

request!(RegisterSeller => SellerDto, Command);

impl Validate for RegisterSeller {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.owner_user_id, "owner_user_id"))
            .guard(guard::text(&self.business_name, BUSINESS_NAME_MAX, "business_name"))
            .guard(guard::email(&self.contact_email, "contact_email"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApproveSeller {
    pub seller_id: Uuid,
    pub commission_rate: f64,
}

request!(ApproveSeller => SellerDto, Command);

impl Validate for ApproveSeller {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.seller_id, "seller_id"))
            .guard(guard::in_range(self.commission_rate, 0.0, 100.0, "commission_rate"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RejectSeller {
    pub seller_id: Uuid,
    pub reason: String,
}

request!(RejectSeller => SellerDto, Command);

impl Validate for RejectSeller {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.seller_id, "seller_id"))
            .guard(guard::text(&self.reason, REASON_MAX, "reason"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SuspendSeller {
    pub seller_id: Uuid,
    pub reason: String,
}

request!(SuspendSeller => SellerDto, Command);

impl Validate for SuspendSeller {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.seller_id, "seller_id"))
            .guard(guard::text(&self.reason, REASON_MAX, "reason"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ReinstateSeller {
    pub seller_id: Uuid,
}

request!(ReinstateSeller => SellerDto, Command);

impl Validate for ReinstateSeller {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.seller_id, "seller_id"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DeleteSeller {
    pub seller_id: Uuid,
}

request!(DeleteSeller => bool, Command);

impl Validate for DeleteSeller {}

#[derive(Debug, Clone)]
pub struct OpenStore {
    pub seller_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

request!(OpenStore => StoreDto, Command);

impl Validate for OpenStore {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.seller_id, "seller_id"))
            .guard(guard::text(&self.name, BUSINESS_NAME_MAX, "name"))
            .guard(guard::slug(&self.slug, STORE_SLUG_MAX, "slug"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CloseStore {
    pub store_id: Uuid,
}

request!(CloseStore => StoreDto, Command);

impl Validate for CloseStore {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.store_id, "store_id"))
            .finish()
    }
}

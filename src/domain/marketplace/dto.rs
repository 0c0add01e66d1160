use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{Seller, SellerStatus, Store};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerDto {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub business_name: String,
    pub contact_email: String,
    pub status: SellerStatus,
    pub commission_rate: f64,
    pub rejection_reason: Option<String>,
    pub suspension_reason: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Seller> for SellerDto {
    fn from(s: &Seller) -> Self {
        Self {
            id: s.base.id,
            owner_user_id: s.owner_user_id,
            business_name: s.business_name.clone(),
            contact_email: s.contact_email.clone(),
            status: s.status,
            commission_rate: s.commission_rate,
            rejection_reason: s.rejection_reason.clone(),
            suspension_reason: s.suspension_reason.clone(),
            approved_at: s.approved_at,
            created_at: s.base.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDto {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
}

impl From<&Store> for StoreDto {
    fn from(s: &Store) -> Self {
        Self {
            id: s.base.id,
            seller_id: s.seller_id,
            name: s.name.clone(),
            slug: s.slug.clone(),
            description: s.description.clone(),
            is_active: s.is_active,
        }
    }
}

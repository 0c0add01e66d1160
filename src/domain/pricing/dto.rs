use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Cents;
use super::model::{PriceList, PriceListEntry, VolumeTier};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceListEntryDto {
    pub product_id: Uuid,
    pub unit_price: Cents,
    pub tiers: Vec<VolumeTier>,
}

impl From<&PriceListEntry> for PriceListEntryDto {
    fn from(e: &PriceListEntry) -> Self {
        Self {
            product_id: e.product_id,
            unit_price: e.unit_price,
            tiers: e.tiers.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceListDto {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub currency: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub entries: Vec<PriceListEntryDto>,
}

impl From<&PriceList> for PriceListDto {
    fn from(p: &PriceList) -> Self {
        Self {
            id: p.base.id,
            company_id: p.company_id,
            name: p.name.clone(),
            currency: p.currency.clone(),
            valid_from: p.valid_from,
            valid_until: p.valid_until,
            is_active: p.is_active,
            entries: p.entries.iter().map(PriceListEntryDto::from).collect(),
        }
    }
}

/// Outcome of B2B price resolution. `price_list_id` is `None` when the
/// catalog price applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct B2bPriceDto {
    pub product_id: Uuid,
    pub company_id: Uuid,
    pub quantity: i32,
    pub catalog_price: Cents,
    pub unit_price: Cents,
    pub total: Cents,
    pub price_list_id: Option<Uuid>,
    pub discount_percent: f64,
}

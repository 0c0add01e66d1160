use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::common::{guard, Cents};
use crate::mediator::{Validate, ValidationErrors, Validator};
use crate::request;
use super::dto::PriceListDto;
use super::model::{VolumeTier, NAME_MAX};

// ============================================================================
// Pricing Commands
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreatePriceList {
    pub company_id: Uuid,
    pub name: String,
    pub currency: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

request!(CreatePriceList => PriceListDto, Command);

impl Validate for CreatePriceList {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.company_id, "company_id"))
            .guard(guard::text(&self.name, NAME_MAX, "name"))
            .check(self.currency.trim().len() == 3, "currency", "currency must be a three-letter code")
            .guard(guard::ordered(self.valid_from, self.valid_until, "valid_from", "valid_until"))
            .finish()
    }
}

/// Upsert: replaces any existing entry for the product.
#[derive(Debug, Clone)]
pub struct SetPriceListEntry {
    pub price_list_id: Uuid,
    pub product_id: Uuid,
    pub unit_price: Cents,
    pub tiers: Vec<VolumeTier>,
}

request!(SetPriceListEntry => PriceListDto, Command);

impl Validate for SetPriceListEntry {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.guard(guard::not_nil(self.price_list_id, "price_list_id"))
            .guard(guard::not_nil(self.product_id, "product_id"))
            .guard(guard::non_negative(self.unit_price, "unit_price"));
        for tier in &self.tiers {
            v.guard(guard::positive(tier.min_quantity, "tiers.min_quantity"))
                .guard(guard::in_range(tier.discount_percent, 0.0, 100.0, "tiers.discount_percent"));
        }
        v.finish()
    }
}

#[derive(Debug, Clone)]
pub struct RemovePriceListEntry {
    pub price_list_id: Uuid,
    pub product_id: Uuid,
}

request!(RemovePriceListEntry => PriceListDto, Command);

impl Validate for RemovePriceListEntry {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.price_list_id, "price_list_id"))
            .guard(guard::not_nil(self.product_id, "product_id"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ActivatePriceList {
    pub price_list_id: Uuid,
}

request!(ActivatePriceList => PriceListDto, Command);

impl Validate for ActivatePriceList {}

#[derive(Debug, Clone)]
pub struct DeactivatePriceList {
    pub price_list_id: Uuid,
}

request!(DeactivatePriceList => PriceListDto, Command);

impl Validate for DeactivatePriceList {}

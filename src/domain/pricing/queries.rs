use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::common::guard;
use crate::mediator::{Validate, ValidationErrors, Validator};
use crate::request;
use super::dto::{B2bPriceDto, PriceListDto};

#[derive(Debug, Clone)]
pub struct GetPriceList {
    pub price_list_id: Uuid,
}

request!(GetPriceList => Option<PriceListDto>, Query);

impl Validate for GetPriceList {}

#[derive(Debug, Clone)]
pub struct ResolveB2bPrice {
    pub company_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Defaults to now.
    pub at: Option<DateTime<Utc>>,
}

request!(ResolveB2bPrice => B2bPriceDto, Query);

impl Validate for ResolveB2bPrice {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.company_id, "company_id"))
            .guard(guard::not_nil(self.product_id, "product_id"))
            .guard(guard::positive(self.quantity, "quantity"))
            .finish()
    }
}

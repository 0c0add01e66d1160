use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::common::guard;
use crate::mediator::{Validate, ValidationErrors, Validator};
use crate::request;
use super::dto::{SalesSummaryDto, SellerPerformanceDto};

pub const DEFAULT_TOP_PRODUCTS: u32 = 5;
pub const MAX_TOP_PRODUCTS: u32 = 50;

#[derive(Debug, Clone)]
pub struct GetSalesSummary {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub top_products: Option<u32>,
}

request!(GetSalesSummary => SalesSummaryDto, Query);

impl Validate for GetSalesSummary {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.guard(guard::ordered(self.from, self.to, "from", "to"));
        if let Some(limit) = self.top_products {
            v.guard(guard::in_range(limit, 1, MAX_TOP_PRODUCTS, "top_products"));
        }
        v.finish()
    }
}

#[derive(Debug, Clone)]
pub struct GetSellerPerformance {
    pub seller_id: Uuid,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

request!(GetSellerPerformance => SellerPerformanceDto, Query);

impl Validate for GetSellerPerformance {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.seller_id, "seller_id"))
            .guard(guard::ordered(self.from, self.to, "from", "to"))
            .finish()
    }
}

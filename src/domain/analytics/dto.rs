use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Cents;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSalesDto {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Cents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummaryDto {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub order_count: u64,
    pub delivered_count: u64,
    pub cancelled_count: u64,
    /// Sum of non-cancelled order totals.
    pub gross_revenue: Cents,
    pub average_order_value: Cents,
    pub top_products: Vec<ProductSalesDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerPerformanceDto {
    pub seller_id: Uuid,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub order_count: u64,
    pub units_sold: i64,
    pub revenue: Cents,
}

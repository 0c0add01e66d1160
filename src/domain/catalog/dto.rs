use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::Cents;
use super::model::{Category, Product};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
}

impl From<&Category> for CategoryDto {
    fn from(c: &Category) -> Self {
        Self {
            id: c.base.id,
            name: c.name.clone(),
            slug: c.slug.clone(),
            parent_id: c.parent_id,
            is_active: c.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub price: Cents,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductDto {
    fn from(p: &Product) -> Self {
        Self {
            id: p.base.id,
            seller_id: p.seller_id,
            category_id: p.category_id,
            name: p.name.clone(),
            sku: p.sku.clone(),
            description: p.description.clone(),
            price: p.price,
            stock_quantity: p.stock_quantity,
            is_active: p.is_active,
            in_stock: p.stock_quantity > 0,
            created_at: p.base.created_at,
            updated_at: p.base.updated_at,
        }
    }
}

use uuid::Uuid;

use crate::domain::common::{guard, Cents};
use crate::mediator::{Validate, ValidationErrors, Validator};
use crate::request;
use super::dto::{CategoryDto, ProductDto};
use super::model::{DESCRIPTION_MAX, NAME_MAX, SKU_MAX, SLUG_MAX};

// ============================================================================
// Catalog Commands
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
}

request!(CreateCategory => CategoryDto, Command);

impl Validate for CreateCategory {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::text(&self.name, NAME_MAX, "name"))
            .guard(guard::slug(&self.slug, SLUG_MAX, "slug"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub seller_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub price: Cents,
    pub stock_quantity: i32,
}

request!(CreateProduct => ProductDto, Command);

impl Validate for CreateProduct {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.guard(guard::not_nil(self.seller_id, "seller_id"))
            .guard(guard::not_nil(self.category_id, "category_id"))
            .guard(guard::text(&self.name, NAME_MAX, "name"))
            .guard(guard::text(&self.sku, SKU_MAX, "sku"))
            .guard(guard::non_negative(self.price, "price"))
            .guard(guard::non_negative(self.stock_quantity, "stock_quantity"));
        if let Some(description) = &self.description {
            v.guard(guard::max_len(description, DESCRIPTION_MAX, "description"));
        }
        v.finish()
    }
}

#[derive(Debug, Clone)]
pub struct UpdateProductDetails {
    pub product_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

request!(UpdateProductDetails => ProductDto, Command);

impl Validate for UpdateProductDetails {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.product_id, "product_id"))
            .guard(guard::text(&self.name, NAME_MAX, "name"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ChangeProductPrice {
    pub product_id: Uuid,
    pub price: Cents,
}

request!(ChangeProductPrice => ProductDto, Command);

impl Validate for ChangeProductPrice {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.product_id, "product_id"))
            .guard(guard::non_negative(self.price, "price"))
            .finish()
    }
}

/// Positive delta restocks, negative delta removes stock.
#[derive(Debug, Clone)]
pub struct AdjustStock {
    pub product_id: Uuid,
    pub delta: i32,
}

request!(AdjustStock => ProductDto, Command, retry_on_conflict);

impl Validate for AdjustStock {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.product_id, "product_id"))
            .check(self.delta != 0, "delta", "delta must not be zero")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ActivateProduct {
    pub product_id: Uuid,
}

request!(ActivateProduct => ProductDto, Command);

impl Validate for ActivateProduct {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.product_id, "product_id"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DeactivateProduct {
    pub product_id: Uuid,
}

request!(DeactivateProduct => ProductDto, Command);

impl Validate for DeactivateProduct {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.product_id, "product_id"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DeleteProduct {
    pub product_id: Uuid,
}

request!(DeleteProduct => bool, Command);

impl Validate for DeleteProduct {}

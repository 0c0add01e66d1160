use uuid::Uuid;

use crate::domain::common::{PageRequest, PagedResult};
use crate::mediator::Validate;
use crate::request;
use super::dto::{CategoryDto, ProductDto};

// ============================================================================
// Catalog Queries
// ============================================================================

#[derive(Debug, Clone)]
pub struct GetProductById {
    pub product_id: Uuid,
}

request!(GetProductById => Option<ProductDto>, Query);

impl Validate for GetProductById {}

#[derive(Debug, Clone, Default)]
pub struct ListProducts {
    pub category_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub active_only: bool,
    pub page: Option<PageRequest>,
}

request!(ListProducts => PagedResult<ProductDto>, Query);

impl Validate for ListProducts {}

#[derive(Debug, Clone, Default)]
pub struct ListCategories {
    /// `None` lists every category.
    pub parent_id: Option<Uuid>,
    pub active_only: bool,
}

request!(ListCategories => Vec<CategoryDto>, Query);

impl Validate for ListCategories {}

use uuid::Uuid;

use crate::domain::common::GuardError;
use crate::error::AppError;

// ============================================================================
// Catalog Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("A category with slug '{0}' already exists")]
    DuplicateSlug(String),

    #[error("A product with SKU '{0}' already exists")]
    DuplicateSku(String),

    #[error("Category {0} is inactive")]
    CategoryInactive(Uuid),

    #[error("Product {0} is not available for sale")]
    ProductUnavailable(Uuid),

    #[error("Insufficient stock for product {product_id}: {available} available, {requested} requested")]
    InsufficientStock {
        product_id: Uuid,
        available: i32,
        requested: i32,
    },

    #[error("Product {0} has been deleted")]
    Deleted(Uuid),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Guard(guard) => guard.into(),
            other => AppError::BusinessRule(other.to_string()),
        }
    }
}

// ============================================================================
// Catalog Domain - categories and products
// ============================================================================
//
// - model.rs    - Category and Product entities
// - events.rs   - CategoryEvent, ProductEvent
// - errors.rs   - CatalogError
// - commands.rs - CreateProduct, AdjustStock, ...
// - queries.rs  - GetProductById, ListProducts, ListCategories
// - dto.rs      - ProductDto, CategoryDto
// - handlers.rs - CatalogHandlers and registration
//
// ============================================================================

pub mod commands;
pub mod dto;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod model;
pub mod queries;

pub use commands::*;
pub use dto::*;
pub use errors::*;
pub use events::*;
pub use handlers::{invalidate_product, register, CatalogHandlers};
pub use model::*;
pub use queries::*;

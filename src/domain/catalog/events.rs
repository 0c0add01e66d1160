use serde::Serialize;
use uuid::Uuid;

use crate::domain::common::Cents;
use crate::persistence::DomainEvent;

// ============================================================================
// Catalog Events
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum CategoryEvent {
    CategoryCreated {
        category_id: Uuid,
        name: String,
        slug: String,
        parent_id: Option<Uuid>,
    },
}

impl DomainEvent for CategoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::CategoryCreated { .. } => "CategoryCreated",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ProductEvent {
    ProductCreated {
        product_id: Uuid,
        seller_id: Uuid,
        category_id: Uuid,
        sku: String,
        price: Cents,
    },
    ProductDetailsUpdated {
        product_id: Uuid,
        name: String,
    },
    ProductPriceChanged {
        product_id: Uuid,
        old_price: Cents,
        new_price: Cents,
    },
    StockAdjusted {
        product_id: Uuid,
        delta: i32,
        stock_quantity: i32,
    },
    ProductActivated {
        product_id: Uuid,
    },
    ProductDeactivated {
        product_id: Uuid,
    },
    ProductDeleted {
        product_id: Uuid,
    },
}

impl DomainEvent for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::ProductCreated { .. } => "ProductCreated",
            Self::ProductDetailsUpdated { .. } => "ProductDetailsUpdated",
            Self::ProductPriceChanged { .. } => "ProductPriceChanged",
            Self::StockAdjusted { .. } => "StockAdjusted",
            Self::ProductActivated { .. } => "ProductActivated",
            Self::ProductDeactivated { .. } => "ProductDeactivated",
            Self::ProductDeleted { .. } => "ProductDeleted",
        }
    }
}

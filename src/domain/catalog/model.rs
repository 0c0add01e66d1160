use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{guard, Cents};
use crate::persistence::{Entity, EntityBase, UniqueKey};
use super::errors::CatalogError;
use super::events::{CategoryEvent, ProductEvent};

pub const NAME_MAX: usize = 200;
pub const SLUG_MAX: usize = 100;
pub const SKU_MAX: usize = 64;
pub const DESCRIPTION_MAX: usize = 4000;

// ============================================================================
// Category
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(flatten)]
    pub base: EntityBase,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
    pub is_active: bool,
    #[serde(skip)]
    events: Vec<CategoryEvent>,
}

impl Category {
    pub fn create(name: &str, slug: &str, parent_id: Option<Uuid>) -> Result<Self, CatalogError> {
        let name = guard::text(name, NAME_MAX, "name")?;
        let slug = guard::slug(slug, SLUG_MAX, "slug")?;
        if let Some(parent) = parent_id {
            guard::not_nil(parent, "parent_id")?;
        }

        let base = EntityBase::new();
        let events = vec![CategoryEvent::CategoryCreated {
            category_id: base.id,
            name: name.clone(),
            slug: slug.clone(),
            parent_id,
        }];

        Ok(Self {
            base,
            name,
            slug,
            parent_id,
            is_active: true,
            events,
        })
    }
}

impl Entity for Category {
    type Event = CategoryEvent;
    const KIND: &'static str = "category";
    const TOPIC: &'static str = "catalog-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<CategoryEvent> {
        std::mem::take(&mut self.events)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("slug", self.slug.as_str())]
    }
}

// ============================================================================
// Product
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    #[serde(flatten)]
    pub base: EntityBase,
    pub seller_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub price: Cents,
    pub stock_quantity: i32,
    pub is_active: bool,
    #[serde(skip)]
    events: Vec<ProductEvent>,
}

/// Input for `Product::create`.
#[derive(Debug, Clone)]
pub struct NewProduct<'a> {
    pub seller_id: Uuid,
    pub category_id: Uuid,
    pub name: &'a str,
    pub sku: &'a str,
    pub description: Option<&'a str>,
    pub price: Cents,
    pub stock_quantity: i32,
}

impl Product {
    pub fn create(input: NewProduct<'_>) -> Result<Self, CatalogError> {
        let seller_id = guard::not_nil(input.seller_id, "seller_id")?;
        let category_id = guard::not_nil(input.category_id, "category_id")?;
        let name = guard::text(input.name, NAME_MAX, "name")?;
        let sku = guard::text(input.sku, SKU_MAX, "sku")?.to_uppercase();
        let description = normalize_description(input.description)?;
        let price = guard::non_negative(input.price, "price")?;
        let stock_quantity = guard::non_negative(input.stock_quantity, "stock_quantity")?;

        let base = EntityBase::new();
        let events = vec![ProductEvent::ProductCreated {
            product_id: base.id,
            seller_id,
            category_id,
            sku: sku.clone(),
            price,
        }];

        Ok(Self {
            base,
            seller_id,
            category_id,
            name,
            sku,
            description,
            price,
            stock_quantity,
            is_active: true,
            events,
        })
    }

    /// Active, not deleted and with enough stock for `quantity`.
    pub fn ensure_available(&self, quantity: i32) -> Result<(), CatalogError> {
        if self.base.is_deleted || !self.is_active {
            return Err(CatalogError::ProductUnavailable(self.base.id));
        }
        if self.stock_quantity < quantity {
            return Err(CatalogError::InsufficientStock {
                product_id: self.base.id,
                available: self.stock_quantity,
                requested: quantity,
            });
        }
        Ok(())
    }

    pub fn update_details(&mut self, name: &str, description: Option<&str>) -> Result<(), CatalogError> {
        self.ensure_not_deleted()?;
        self.name = guard::text(name, NAME_MAX, "name")?;
        self.description = normalize_description(description)?;
        self.base.touch();
        self.events.push(ProductEvent::ProductDetailsUpdated {
            product_id: self.base.id,
            name: self.name.clone(),
        });
        Ok(())
    }

    pub fn change_price(&mut self, new_price: Cents) -> Result<(), CatalogError> {
        self.ensure_not_deleted()?;
        let new_price = guard::non_negative(new_price, "price")?;
        if new_price == self.price {
            return Ok(());
        }

        let old_price = self.price;
        self.price = new_price;
        self.base.touch();
        self.events.push(ProductEvent::ProductPriceChanged {
            product_id: self.base.id,
            old_price,
            new_price,
        });
        Ok(())
    }

    /// Resulting stock must stay non-negative.
    pub fn adjust_stock(&mut self, delta: i32) -> Result<(), CatalogError> {
        self.ensure_not_deleted()?;
        if delta == 0 {
            return Ok(());
        }

        let new_quantity = self.stock_quantity.saturating_add(delta);
        if new_quantity < 0 {
            return Err(CatalogError::InsufficientStock {
                product_id: self.base.id,
                available: self.stock_quantity,
                requested: -delta,
            });
        }

        self.stock_quantity = new_quantity;
        self.base.touch();
        self.events.push(ProductEvent::StockAdjusted {
            product_id: self.base.id,
            delta,
            stock_quantity: new_quantity,
        });
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), CatalogError> {
        self.ensure_not_deleted()?;
        if self.is_active {
            return Ok(());
        }
        self.is_active = true;
        self.base.touch();
        self.events.push(ProductEvent::ProductActivated {
            product_id: self.base.id,
        });
        Ok(())
    }

    pub fn deactivate(&mut self) {
        if !self.is_active {
            return;
        }
        self.is_active = false;
        self.base.touch();
        self.events.push(ProductEvent::ProductDeactivated {
            product_id: self.base.id,
        });
    }

    /// Returns false when already deleted.
    pub fn mark_as_deleted(&mut self) -> bool {
        if !self.base.mark_deleted() {
            return false;
        }
        self.is_active = false;
        self.events.push(ProductEvent::ProductDeleted {
            product_id: self.base.id,
        });
        true
    }

    fn ensure_not_deleted(&self) -> Result<(), CatalogError> {
        if self.base.is_deleted {
            return Err(CatalogError::Deleted(self.base.id));
        }
        Ok(())
    }
}

fn normalize_description(description: Option<&str>) -> Result<Option<String>, CatalogError> {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => {
            guard::max_len(d, DESCRIPTION_MAX, "description")?;
            Ok(Some(d.to_string()))
        }
        None => Ok(None),
    }
}

impl Entity for Product {
    type Event = ProductEvent;
    const KIND: &'static str = "product";
    const TOPIC: &'static str = "catalog-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<ProductEvent> {
        std::mem::take(&mut self.events)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("sku", self.sku.as_str())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i32) -> Product {
        Product::create(NewProduct {
            seller_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            name: "Desk Lamp",
            sku: "lamp-01",
            description: Some("  Warm light  "),
            price: 2_500,
            stock_quantity: stock,
        })
        .unwrap()
    }

    #[test]
    fn test_create_normalizes_fields() {
        let mut p = product(3);
        assert_eq!(p.sku, "LAMP-01");
        assert_eq!(p.description.as_deref(), Some("Warm light"));
        assert!(p.is_active);
        assert_eq!(p.take_events().len(), 1);
    }

    #[test]
    fn test_create_rejects_negative_price() {
        let result = Product::create(NewProduct {
            seller_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            name: "Lamp",
            sku: "L",
            description: None,
            price: -1,
            stock_quantity: 0,
        });
        assert!(matches!(result, Err(CatalogError::Guard(_))));
    }

    #[test]
    fn test_adjust_stock_never_goes_negative() {
        let mut p = product(2);
        p.adjust_stock(-2).unwrap();
        assert_eq!(p.stock_quantity, 0);
        assert!(matches!(
            p.adjust_stock(-1),
            Err(CatalogError::InsufficientStock { available: 0, requested: 1, .. })
        ));
    }

    #[test]
    fn test_state_transitions_are_idempotent() {
        let mut p = product(1);
        p.take_events();

        p.activate().unwrap();
        p.change_price(2_500).unwrap();
        assert!(p.take_events().is_empty());

        p.deactivate();
        p.deactivate();
        assert_eq!(p.take_events().len(), 1);

        assert!(p.mark_as_deleted());
        assert!(!p.mark_as_deleted());
        assert_eq!(p.take_events().len(), 1);
        assert!(matches!(p.activate(), Err(CatalogError::Deleted(_))));
    }

    #[test]
    fn test_ensure_available() {
        let mut p = product(1);
        assert!(p.ensure_available(1).is_ok());
        assert!(p.ensure_available(2).is_err());
        p.deactivate();
        assert!(matches!(p.ensure_available(1), Err(CatalogError::ProductUnavailable(_))));
    }

    #[test]
    fn test_category_slug_guard() {
        assert!(Category::create("Lighting", "lighting", None).is_ok());
        assert!(Category::create("Lighting", "Lighting!", None).is_err());
    }
}

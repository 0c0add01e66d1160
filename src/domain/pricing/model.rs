use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{apply_discount, guard, Cents};
use crate::persistence::{Entity, EntityBase};
use super::errors::PricingError;
use super::events::PriceListEvent;

pub const NAME_MAX: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeTier {
    pub min_quantity: i32,
    pub discount_percent: f64,
}

impl VolumeTier {
    pub fn new(min_quantity: i32, discount_percent: f64) -> Result<Self, PricingError> {
        Ok(Self {
            min_quantity: guard::positive(min_quantity, "min_quantity")?,
            discount_percent: guard::in_range(discount_percent, 0.0, 100.0, "discount_percent")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceListEntry {
    pub product_id: Uuid,
    pub unit_price: Cents,
    /// Sorted by ascending minimum quantity.
    pub tiers: Vec<VolumeTier>,
}

impl PriceListEntry {
    pub fn new(product_id: Uuid, unit_price: Cents, tiers: Vec<VolumeTier>) -> Result<Self, PricingError> {
        let product_id = guard::not_nil(product_id, "product_id")?;
        let unit_price = guard::non_negative(unit_price, "unit_price")?;

        let mut seen = HashSet::new();
        let mut checked = Vec::with_capacity(tiers.len());
        for tier in tiers {
            let tier = VolumeTier::new(tier.min_quantity, tier.discount_percent)?;
            if !seen.insert(tier.min_quantity) {
                return Err(PricingError::DuplicateTier(tier.min_quantity));
            }
            checked.push(tier);
        }
        checked.sort_by_key(|t| t.min_quantity);

        Ok(Self {
            product_id,
            unit_price,
            tiers: checked,
        })
    }

    /// The tier with the highest minimum quantity not above `quantity`.
    pub fn tier_for(&self, quantity: i32) -> Option<&VolumeTier> {
        self.tiers.iter().rev().find(|t| t.min_quantity <= quantity)
    }

    pub fn effective_price(&self, quantity: i32) -> Cents {
        match self.tier_for(quantity) {
            Some(tier) => apply_discount(self.unit_price, tier.discount_percent),
            None => self.unit_price,
        }
    }
}

// ============================================================================
// PriceList
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceList {
    #[serde(flatten)]
    pub base: EntityBase,
    pub company_id: Uuid,
    pub name: String,
    pub currency: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub entries: Vec<PriceListEntry>,
    #[serde(skip)]
    events: Vec<PriceListEvent>,
}

pub struct NewPriceList<'a> {
    pub company_id: Uuid,
    pub name: &'a str,
    pub currency: &'a str,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}

pub fn normalize_currency(currency: &str) -> Result<String, PricingError> {
    let code = guard::not_empty(currency, "currency")?.to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(PricingError::InvalidCurrency(code));
    }
    Ok(code)
}

impl PriceList {
    /// Lists start inactive; activation requires at least one entry.
    pub fn create(new: NewPriceList<'_>) -> Result<Self, PricingError> {
        let company_id = guard::not_nil(new.company_id, "company_id")?;
        let name = guard::text(new.name, NAME_MAX, "name")?;
        let currency = normalize_currency(new.currency)?;
        guard::ordered(new.valid_from, new.valid_until, "valid_from", "valid_until")?;

        let base = EntityBase::new();
        let events = vec![PriceListEvent::PriceListCreated {
            price_list_id: base.id,
            company_id,
            currency: currency.clone(),
            valid_from: new.valid_from,
            valid_until: new.valid_until,
        }];

        Ok(Self {
            base,
            company_id,
            name,
            currency,
            valid_from: new.valid_from,
            valid_until: new.valid_until,
            is_active: false,
            entries: Vec::new(),
            events,
        })
    }

    pub fn entry(&self, product_id: Uuid) -> Option<&PriceListEntry> {
        self.entries.iter().find(|e| e.product_id == product_id)
    }

    /// Insert or replace the entry for the entry's product.
    pub fn set_entry(&mut self, entry: PriceListEntry) {
        if self.entry(entry.product_id) == Some(&entry) {
            return;
        }

        let event = PriceListEvent::PriceListEntrySet {
            price_list_id: self.base.id,
            product_id: entry.product_id,
            unit_price: entry.unit_price,
            tier_count: entry.tiers.len(),
        };
        match self.entries.iter_mut().find(|e| e.product_id == entry.product_id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self.base.touch();
        self.events.push(event);
    }

    pub fn remove_entry(&mut self, product_id: Uuid) -> Result<(), PricingError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.product_id != product_id);
        if self.entries.len() == before {
            return Err(PricingError::EntryNotFound(product_id));
        }

        self.base.touch();
        self.events.push(PriceListEvent::PriceListEntryRemoved {
            price_list_id: self.base.id,
            product_id,
        });
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), PricingError> {
        if self.is_active {
            return Ok(());
        }
        if self.entries.is_empty() {
            return Err(PricingError::NoEntries);
        }
        self.is_active = true;
        self.base.touch();
        self.events.push(PriceListEvent::PriceListActivated {
            price_list_id: self.base.id,
        });
        Ok(())
    }

    pub fn deactivate(&mut self) {
        if !self.is_active {
            return;
        }
        self.is_active = false;
        self.base.touch();
        self.events.push(PriceListEvent::PriceListDeactivated {
            price_list_id: self.base.id,
        });
    }

    /// Validity window is half-open: `[valid_from, valid_until)`.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.is_active && self.valid_from <= at && at < self.valid_until
    }
}

impl Entity for PriceList {
    type Event = PriceListEvent;
    const KIND: &'static str = "price_list";
    const TOPIC: &'static str = "pricing-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<PriceListEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn price_list() -> PriceList {
        let now = Utc::now();
        PriceList::create(NewPriceList {
            company_id: Uuid::new_v4(),
            name: "Wholesale",
            currency: "eur",
            valid_from: now - Duration::days(1),
            valid_until: now + Duration::days(30),
        })
        .unwrap()
    }

    fn tier(min_quantity: i32, discount_percent: f64) -> VolumeTier {
        VolumeTier {
            min_quantity,
            discount_percent,
        }
    }

    #[test]
    fn test_create_validates_window_and_currency() {
        let list = price_list();
        assert_eq!(list.currency, "EUR");
        assert!(!list.is_active);

        let now = Utc::now();
        let inverted = PriceList::create(NewPriceList {
            company_id: Uuid::new_v4(),
            name: "Bad",
            currency: "USD",
            valid_from: now,
            valid_until: now,
        });
        assert!(matches!(inverted, Err(PricingError::Guard(_))));

        assert!(matches!(normalize_currency("euro"), Err(PricingError::InvalidCurrency(_))));
    }

    #[test]
    fn test_best_matching_tier() {
        let entry = PriceListEntry::new(
            Uuid::new_v4(),
            1_000,
            vec![tier(100, 20.0), tier(10, 5.0)],
        )
        .unwrap();

        assert_eq!(entry.tiers[0].min_quantity, 10);
        assert_eq!(entry.effective_price(1), 1_000);
        assert_eq!(entry.effective_price(10), 950);
        assert_eq!(entry.effective_price(99), 950);
        assert_eq!(entry.effective_price(250), 800);
    }

    #[test]
    fn test_tier_rules() {
        let product = Uuid::new_v4();
        assert!(matches!(
            PriceListEntry::new(product, 500, vec![tier(0, 5.0)]),
            Err(PricingError::Guard(_))
        ));
        assert!(matches!(
            PriceListEntry::new(product, 500, vec![tier(5, 101.0)]),
            Err(PricingError::Guard(_))
        ));
        assert!(matches!(
            PriceListEntry::new(product, 500, vec![tier(5, 1.0), tier(5, 2.0)]),
            Err(PricingError::DuplicateTier(5))
        ));
    }

    #[test]
    fn test_entries_are_unique_per_product() {
        let mut list = price_list();
        let product = Uuid::new_v4();
        list.set_entry(PriceListEntry::new(product, 500, vec![]).unwrap());
        list.set_entry(PriceListEntry::new(product, 450, vec![]).unwrap());
        assert_eq!(list.entries.len(), 1);
        assert_eq!(list.entry(product).map(|e| e.unit_price), Some(450));

        list.remove_entry(product).unwrap();
        assert!(matches!(list.remove_entry(product), Err(PricingError::EntryNotFound(_))));
    }

    #[test]
    fn test_activation_requires_entries() {
        let mut list = price_list();
        assert!(matches!(list.activate(), Err(PricingError::NoEntries)));

        list.set_entry(PriceListEntry::new(Uuid::new_v4(), 500, vec![]).unwrap());
        list.take_events();
        list.activate().unwrap();
        list.activate().unwrap();
        assert_eq!(list.take_events().len(), 1);
        assert!(list.is_valid_at(Utc::now()));
        assert!(!list.is_valid_at(list.valid_until));
    }
}

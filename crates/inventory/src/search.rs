use crate::{InventoryItem, Price};
use storefront_core::{DomainError, DomainResult};

/// Catalog search criteria. Every supplied criterion must match (logical AND).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Case-insensitive substring of the item name.
    pub name: Option<String>,
    /// Case-insensitive exact category.
    pub category: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Price>,
    /// Inclusive upper price bound.
    pub max_price: Option<Price>,
}

impl SearchFilter {
    /// Drop blank text criteria and reject an inverted price range.
    pub fn normalized(self) -> DomainResult<Self> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(DomainError::validation(format!(
                    "min_price {min} is greater than max_price {max}"
                )));
            }
        }

        let non_blank = |s: String| {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        };

        Ok(Self {
            name: self.name.and_then(non_blank),
            category: self.category.and_then(non_blank),
            ..self
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    pub fn matches(&self, item: &InventoryItem) -> bool {
        let f = &item.fields;

        if let Some(name) = &self.name {
            if !f.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            match &f.category {
                Some(c) if c.to_lowercase() == category.to_lowercase() => {}
                _ => return false,
            }
        }
        if self.min_price.is_some_and(|min| f.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| f.price > max) {
            return false;
        }
        true
    }
}

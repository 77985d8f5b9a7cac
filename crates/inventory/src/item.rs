use serde::Serialize;

use storefront_core::{DomainError, DomainResult, ItemId, Revision};

use crate::Price;

/// Mutable state of a catalog row: everything a write replaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFields {
    pub name: String,
    pub category: Option<String>,
    pub price: Price,
    pub quantity: u32,
    pub image_url: Option<String>,
}

/// A stored catalog item.
///
/// # Invariants
/// - `quantity` is never negative (enforced by its type and by the transitions below).
/// - `revision` strictly increases on every successful mutation; the store only
///   accepts a write whose expected revision equals the stored one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    pub id: ItemId,
    #[serde(flatten)]
    pub fields: ItemFields,
    pub revision: Revision,
}

impl InventoryItem {
    pub fn new(id: ItemId, fields: ItemFields, revision: Revision) -> Self {
        Self { id, fields, revision }
    }

    pub fn quantity(&self) -> u32 {
        self.fields.quantity
    }

    /// Fields after an update. An absent quantity keeps the stored one.
    pub fn revised(&self, spec: ValidatedSpec) -> ItemFields {
        spec.into_fields(self.fields.quantity)
    }

    /// Fields after selling `qty` units.
    pub fn purchased(&self, qty: u32) -> DomainResult<ItemFields> {
        ensure_positive(qty)?;
        let available = self.fields.quantity;
        if available < qty {
            return Err(DomainError::InsufficientStock {
                requested: qty,
                available,
            });
        }
        Ok(ItemFields {
            quantity: available - qty,
            ..self.fields.clone()
        })
    }

    /// Fields after receiving `qty` units.
    pub fn restocked(&self, qty: u32) -> DomainResult<ItemFields> {
        ensure_positive(qty)?;
        let quantity = self
            .fields
            .quantity
            .checked_add(qty)
            .ok_or_else(|| DomainError::validation("restock would overflow the stock counter"))?;
        Ok(ItemFields {
            quantity,
            ..self.fields.clone()
        })
    }
}

fn ensure_positive(qty: u32) -> DomainResult<()> {
    if qty == 0 {
        return Err(DomainError::validation("quantity must be a positive integer"));
    }
    Ok(())
}

/// Unvalidated create/update input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSpec {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Price>,
    pub quantity: Option<i64>,
    pub image_url: Option<String>,
}

/// Create/update input that passed [`ItemSpec::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSpec {
    name: String,
    category: Option<String>,
    price: Price,
    quantity: Option<u32>,
    image_url: Option<String>,
}

impl ItemSpec {
    /// Check the business rules shared by create and update.
    ///
    /// - name: required, not blank
    /// - price: required (non-negativity is guaranteed by [`Price`])
    /// - quantity: optional, non-negative
    pub fn validate(self) -> DomainResult<ValidatedSpec> {
        let name = match self.name {
            Some(n) if !n.trim().is_empty() => n,
            _ => return Err(DomainError::validation("Name is required")),
        };

        let price = self
            .price
            .ok_or_else(|| DomainError::validation("Price is required"))?;

        let quantity = match self.quantity {
            None => None,
            Some(q) if q < 0 => return Err(DomainError::validation("Quantity must be non-negative")),
            Some(q) => Some(
                u32::try_from(q).map_err(|_| DomainError::validation("Quantity is too large"))?,
            ),
        };

        Ok(ValidatedSpec {
            name,
            category: self.category.filter(|c| !c.trim().is_empty()),
            price,
            quantity,
            image_url: self.image_url.filter(|u| !u.trim().is_empty()),
        })
    }
}

impl ValidatedSpec {
    /// Materialize the row fields; `default_quantity` fills an absent quantity.
    pub fn into_fields(self, default_quantity: u32) -> ItemFields {
        ItemFields {
            name: self.name,
            category: self.category,
            price: self.price,
            quantity: self.quantity.unwrap_or(default_quantity),
            image_url: self.image_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn ladoo(quantity: u32) -> InventoryItem {
        InventoryItem::new(
            ItemId::new(),
            ItemFields {
                name: "Ladoo".to_string(),
                category: Some("Indian".to_string()),
                price: Price::from_minor_units(2500),
                quantity,
                image_url: None,
            },
            Revision::INITIAL,
        )
    }

    fn spec() -> ItemSpec {
        ItemSpec {
            name: Some("Barfi".to_string()),
            category: Some("Indian".to_string()),
            price: Some(Price::from_minor_units(1000)),
            quantity: Some(4),
            image_url: None,
        }
    }

    #[test]
    fn validate_requires_name_and_price() {
        let no_name = ItemSpec { name: Some("  ".to_string()), ..spec() };
        assert_eq!(no_name.validate(), Err(DomainError::validation("Name is required")));

        let no_price = ItemSpec { price: None, ..spec() };
        assert_eq!(no_price.validate(), Err(DomainError::validation("Price is required")));
    }

    #[test]
    fn validate_rejects_negative_quantity() {
        let spec = ItemSpec { quantity: Some(-1), ..spec() };
        assert_eq!(spec.validate(), Err(DomainError::validation("Quantity must be non-negative")));
    }

    #[test]
    fn absent_quantity_defaults_on_create_and_is_kept_on_update() {
        let spec = ItemSpec { quantity: None, ..spec() };
        assert_eq!(spec.clone().validate().unwrap().into_fields(0).quantity, 0);
        assert_eq!(ladoo(7).revised(spec.validate().unwrap()).quantity, 7);
    }

    #[test]
    fn purchase_beyond_stock_reports_requested_and_available() {
        let err = ladoo(7).purchased(10).unwrap_err();
        assert_eq!(err, DomainError::InsufficientStock { requested: 10, available: 7 });
        assert_eq!(err.to_string(), "Requested 10 but only 7 available");
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert!(matches!(ladoo(1).purchased(0), Err(DomainError::Validation(_))));
        assert!(matches!(ladoo(1).restocked(0), Err(DomainError::Validation(_))));
    }

    #[test]
    fn restock_overflow_is_rejected() {
        assert!(ladoo(u32::MAX).restocked(1).is_err());
    }

    #[test]
    fn serializes_flat_with_string_price() {
        let json = serde_json::to_value(ladoo(3)).unwrap();
        assert_eq!(json["name"], "Ladoo");
        assert_eq!(json["price"], "25.00");
        assert_eq!(json["quantity"], 3);
        assert_eq!(json["revision"], 0);
    }

    proptest! {
        #[test]
        fn restock_then_purchase_restores_quantity(start in 0u32..1_000_000, qty in 1u32..1_000_000) {
            let item = ladoo(start);
            let restocked = InventoryItem::new(item.id, item.restocked(qty).unwrap(), item.revision.next());
            let back = restocked.purchased(qty).unwrap();
            prop_assert_eq!(back.quantity, start);
        }

        #[test]
        fn purchase_never_underflows(start in 0u32..1_000, qty in 1u32..2_000) {
            match ladoo(start).purchased(qty) {
                Ok(fields) => prop_assert_eq!(fields.quantity, start - qty),
                Err(DomainError::InsufficientStock { requested, available }) => {
                    prop_assert!(qty > start);
                    prop_assert_eq!((requested, available), (qty, start));
                }
                Err(other) => prop_assert!(false, "unexpected error {other:?}"),
            }
        }
    }
}

//! Inventory catalog rules.
//!
//! This crate contains the business rules for catalog items, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage). Persistence and
//! the compare-and-swap write protocol live in `storefront-infra`.

pub mod item;
pub mod price;
pub mod search;

pub use item::{InventoryItem, ItemFields, ItemSpec, ValidatedSpec};
pub use price::{Price, PriceError};
pub use search::SearchFilter;

//! `storefront-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod revision;

pub use error::{DomainError, DomainResult};
pub use id::{AccountId, ItemId};
pub use revision::Revision;

//! Storage boundary for accounts and catalog items.
//!
//! The traits make no storage assumptions: the in-memory implementations back
//! tests and local runs, the Postgres ones (feature `postgres`) back production.
//!
//! ## Write protocol for items
//!
//! Every item mutation is a compare-and-swap on the row's [`Revision`]:
//! the caller passes the revision it read, the store applies the write and
//! bumps the revision only if the stored revision still equals it, and
//! otherwise reports [`StoreError::RevisionMismatch`]. No lock is held across
//! the caller's read-modify-write span.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use storefront_auth::{Account, NewAccount};
use storefront_core::{ItemId, Revision};
use storefront_inventory::{InventoryItem, ItemFields, SearchFilter};

use crate::ServiceError;

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::{InMemoryCredentialStore, InMemoryInventoryStore};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresCredentialStore, PostgresInventoryStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    #[error("revision mismatch (expected {expected}, found {actual})")]
    RevisionMismatch { expected: Revision, actual: Revision },

    #[error("duplicate value for unique field '{field}'")]
    Duplicate { field: &'static str },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Translate into the service taxonomy; `entity` names what was missing.
    pub fn into_service(self, entity: &'static str) -> ServiceError {
        use storefront_core::DomainError;

        match self {
            StoreError::NotFound => DomainError::not_found(entity).into(),
            StoreError::RevisionMismatch { expected, actual } => match expected.check(actual) {
                Err(conflict) => conflict.into(),
                Ok(()) => ServiceError::Internal(format!(
                    "store reported a mismatch for equal revisions ({expected})"
                )),
            },
            StoreError::Duplicate { field: "username" } => DomainError::DuplicateUsername.into(),
            StoreError::Duplicate { field: "email" } => DomainError::DuplicateEmail.into(),
            StoreError::Duplicate { field } => {
                ServiceError::Internal(format!("unexpected unique violation on '{field}'"))
            }
            StoreError::Unavailable(msg) => ServiceError::Unavailable(msg),
            StoreError::Backend(msg) => ServiceError::Internal(msg),
        }
    }
}

/// Persisted accounts. Owns uniqueness of `username` and `email`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    /// Insert a new account. Must fail with [`StoreError::Duplicate`] when the
    /// username or email is taken, even if a caller's pre-check passed.
    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError>;
}

/// Persisted catalog items.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Insert a new row at [`Revision::INITIAL`].
    async fn insert(&self, fields: ItemFields) -> Result<InventoryItem, StoreError>;

    async fn get(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError>;

    /// All rows in a stable order.
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreError>;

    /// Rows matching every criterion of `filter`.
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<InventoryItem>, StoreError>;

    /// Replace the row's fields if its revision is still `expected`; the stored
    /// revision becomes `expected.next()`.
    async fn update_if_revision(
        &self,
        id: ItemId,
        expected: Revision,
        fields: ItemFields,
    ) -> Result<InventoryItem, StoreError>;

    /// Delete the row if its revision is still `expected`.
    async fn delete_if_revision(&self, id: ItemId, expected: Revision) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        (**self).find_by_username(username).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        (**self).exists_by_username(username).await
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError> {
        (**self).insert(account).await
    }
}

#[async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn insert(&self, fields: ItemFields) -> Result<InventoryItem, StoreError> {
        (**self).insert(fields).await
    }

    async fn get(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
        (**self).list().await
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<InventoryItem>, StoreError> {
        (**self).search(filter).await
    }

    async fn update_if_revision(
        &self,
        id: ItemId,
        expected: Revision,
        fields: ItemFields,
    ) -> Result<InventoryItem, StoreError> {
        (**self).update_if_revision(id, expected, fields).await
    }

    async fn delete_if_revision(&self, id: ItemId, expected: Revision) -> Result<(), StoreError> {
        (**self).delete_if_revision(id, expected).await
    }
}

#[cfg(test)]
mod tests {
    use storefront_core::DomainError;

    use super::*;

    #[test]
    fn revision_mismatch_becomes_conflict() {
        let err = StoreError::RevisionMismatch {
            expected: Revision::new(1),
            actual: Revision::new(2),
        };
        assert!(matches!(err.into_service("item"), ServiceError::Domain(DomainError::Conflict(_))));
    }

    #[test]
    fn duplicates_map_by_field() {
        assert_eq!(
            StoreError::Duplicate { field: "username" }.into_service("account"),
            ServiceError::Domain(DomainError::DuplicateUsername)
        );
        assert_eq!(
            StoreError::Duplicate { field: "email" }.into_service("account"),
            ServiceError::Domain(DomainError::DuplicateEmail)
        );
    }

    #[test]
    fn infrastructure_failures_do_not_become_domain_errors() {
        assert_eq!(
            StoreError::Unavailable("down".into()).into_service("item"),
            ServiceError::Unavailable("down".into())
        );
        assert!(matches!(
            StoreError::Backend("boom".into()).into_service("item"),
            ServiceError::Internal(_)
        ));
        assert_eq!(
            StoreError::NotFound.into_service("item"),
            ServiceError::Domain(DomainError::not_found("item"))
        );
    }
}

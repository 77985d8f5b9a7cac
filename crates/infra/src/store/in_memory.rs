use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use storefront_auth::{Account, NewAccount};
use storefront_core::{AccountId, ItemId, Revision};
use storefront_inventory::{InventoryItem, ItemFields, SearchFilter};

use super::{CredentialStore, InventoryStore, StoreError};

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

/// In-memory account store.
///
/// Intended for tests/dev. Uniqueness is checked under the write lock, so
/// concurrent inserts of the same username cannot both succeed.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    // Keyed by username.
    accounts: RwLock<BTreeMap<String, Account>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.get(username).cloned())
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;

        if accounts.contains_key(account.username()) {
            return Err(StoreError::Duplicate { field: "username" });
        }
        if accounts.values().any(|a| a.email == account.email()) {
            return Err(StoreError::Duplicate { field: "email" });
        }

        let account = account.into_account(AccountId::new());
        accounts.insert(account.username.clone(), account.clone());
        Ok(account)
    }
}

/// In-memory catalog store.
///
/// Intended for tests/dev. The revision check and the write happen under one
/// write-lock acquisition, which is what makes the compare-and-swap atomic.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    items: RwLock<BTreeMap<ItemId, InventoryItem>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn insert(&self, fields: ItemFields) -> Result<InventoryItem, StoreError> {
        let item = InventoryItem::new(ItemId::new(), fields, Revision::INITIAL);
        let mut items = self.items.write().map_err(|_| poisoned())?;
        items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.values().cloned().collect())
    }

    async fn search(&self, filter: &SearchFilter) -> Result<Vec<InventoryItem>, StoreError> {
        let items = self.items.read().map_err(|_| poisoned())?;
        Ok(items.values().filter(|i| filter.matches(i)).cloned().collect())
    }

    async fn update_if_revision(
        &self,
        id: ItemId,
        expected: Revision,
        fields: ItemFields,
    ) -> Result<InventoryItem, StoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let stored = items.get_mut(&id).ok_or(StoreError::NotFound)?;

        if !expected.matches(stored.revision) {
            return Err(StoreError::RevisionMismatch {
                expected,
                actual: stored.revision,
            });
        }

        stored.fields = fields;
        stored.revision = expected.next();
        Ok(stored.clone())
    }

    async fn delete_if_revision(&self, id: ItemId, expected: Revision) -> Result<(), StoreError> {
        let mut items = self.items.write().map_err(|_| poisoned())?;
        let stored = items.get(&id).ok_or(StoreError::NotFound)?;

        if !expected.matches(stored.revision) {
            return Err(StoreError::RevisionMismatch {
                expected,
                actual: stored.revision,
            });
        }

        items.remove(&id);
        Ok(())
    }
}

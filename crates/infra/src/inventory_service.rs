//! Catalog use cases.
//!
//! Every mutation reads the current row, derives the new fields in memory and
//! writes them back with a compare-and-swap on the revision it read. A lost
//! race surfaces as `Conflict`; nothing here retries.

use std::time::Duration;

use tracing::{debug, info, instrument};

use storefront_core::{DomainError, ItemId};
use storefront_inventory::{InventoryItem, ItemFields, ItemSpec, SearchFilter};

use crate::deadline::with_deadline;
use crate::store::InventoryStore;
use crate::ServiceError;

const ENTITY: &str = "Item";

#[derive(Debug, Clone)]
pub struct InventoryService<S> {
    store: S,
    store_timeout: Duration,
}

impl<S: InventoryStore> InventoryService<S> {
    pub fn new(store: S, store_timeout: Duration) -> Self {
        Self { store, store_timeout }
    }

    /// Validate and persist a new item at revision 0. Absent quantity means 0.
    #[instrument(skip(self, spec), err)]
    pub async fn create(&self, spec: ItemSpec) -> Result<InventoryItem, ServiceError> {
        let fields = spec.validate()?.into_fields(0);
        let item = with_deadline(self.store_timeout, "insert_item", self.store.insert(fields))
            .await
            .map_err(|e| e.into_service(ENTITY))?;
        info!(item_id = %item.id, name = %item.fields.name, "item created");
        Ok(item)
    }

    pub async fn get(&self, id: ItemId) -> Result<InventoryItem, ServiceError> {
        self.load(id).await
    }

    pub async fn list_all(&self) -> Result<Vec<InventoryItem>, ServiceError> {
        with_deadline(self.store_timeout, "list_items", self.store.list())
            .await
            .map_err(|e| e.into_service(ENTITY))
    }

    /// Criteria are ANDed; an empty filter returns the whole catalog.
    pub async fn search(&self, filter: SearchFilter) -> Result<Vec<InventoryItem>, ServiceError> {
        let filter = filter.normalized()?;
        if filter.is_empty() {
            return self.list_all().await;
        }
        with_deadline(self.store_timeout, "search_items", self.store.search(&filter))
            .await
            .map_err(|e| e.into_service(ENTITY))
    }

    /// Replace the mutable fields. An absent quantity keeps the stored one.
    #[instrument(skip(self, spec), fields(item_id = %id), err)]
    pub async fn update(&self, id: ItemId, spec: ItemSpec) -> Result<InventoryItem, ServiceError> {
        let spec = spec.validate()?;
        let current = self.load(id).await?;
        let fields = current.revised(spec);
        self.write(&current, fields).await
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    pub async fn purchase(&self, id: ItemId, qty: u32) -> Result<InventoryItem, ServiceError> {
        let current = self.load(id).await?;
        let fields = current.purchased(qty).inspect_err(|e| {
            if let DomainError::InsufficientStock { requested, available } = e {
                info!(item_id = %id, requested, available, "purchase rejected: insufficient stock");
            }
        })?;
        self.write(&current, fields).await
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    pub async fn restock(&self, id: ItemId, qty: u32) -> Result<InventoryItem, ServiceError> {
        let current = self.load(id).await?;
        let fields = current.restocked(qty)?;
        self.write(&current, fields).await
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    pub async fn delete(&self, id: ItemId) -> Result<(), ServiceError> {
        let current = self.load(id).await?;
        with_deadline(
            self.store_timeout,
            "delete_item",
            self.store.delete_if_revision(id, current.revision),
        )
        .await
        .map_err(|e| self.report(id, e))?;
        info!(item_id = %id, "item deleted");
        Ok(())
    }

    async fn load(&self, id: ItemId) -> Result<InventoryItem, ServiceError> {
        with_deadline(self.store_timeout, "get_item", self.store.get(id))
            .await
            .map_err(|e| e.into_service(ENTITY))?
            .ok_or_else(|| DomainError::not_found(ENTITY).into())
    }

    async fn write(&self, current: &InventoryItem, fields: ItemFields) -> Result<InventoryItem, ServiceError> {
        let updated = with_deadline(
            self.store_timeout,
            "update_item",
            self.store.update_if_revision(current.id, current.revision, fields),
        )
        .await
        .map_err(|e| self.report(current.id, e))?;

        debug!(
            item_id = %updated.id,
            revision = %updated.revision,
            quantity = updated.quantity(),
            "item written"
        );
        Ok(updated)
    }

    fn report(&self, id: ItemId, err: crate::StoreError) -> ServiceError {
        if let crate::StoreError::RevisionMismatch { expected, actual } = &err {
            info!(item_id = %id, %expected, %actual, "write lost a concurrent race");
        }
        err.into_service(ENTITY)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use storefront_core::Revision;
    use storefront_inventory::Price;

    use super::*;
    use crate::store::{InMemoryInventoryStore, StoreError};

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn service() -> InventoryService<Arc<InMemoryInventoryStore>> {
        InventoryService::new(Arc::new(InMemoryInventoryStore::new()), TIMEOUT)
    }

    fn ladoo(quantity: Option<i64>) -> ItemSpec {
        ItemSpec {
            name: Some("Ladoo".to_string()),
            category: Some("Indian".to_string()),
            price: Some("25.00".parse().unwrap()),
            quantity,
            image_url: None,
        }
    }

    fn domain(err: ServiceError) -> DomainError {
        match err {
            ServiceError::Domain(e) => e,
            other => panic!("expected a domain error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ladoo_purchase_scenario() {
        let svc = service();
        let item = svc.create(ladoo(Some(10))).await.unwrap();
        assert_eq!(item.revision, Revision::INITIAL);
        assert_eq!(item.fields.price, Price::from_minor_units(2500));

        let after = svc.purchase(item.id, 3).await.unwrap();
        assert_eq!(after.quantity(), 7);
        assert_eq!(after.revision, Revision::new(1));

        let err = domain(svc.purchase(item.id, 10).await.unwrap_err());
        assert_eq!(
            err,
            DomainError::InsufficientStock {
                requested: 10,
                available: 7
            }
        );
        assert_eq!(err.to_string(), "Requested 10 but only 7 available");

        let stored = svc.get(item.id).await.unwrap();
        assert_eq!(stored.quantity(), 7);
        assert_eq!(stored.revision, Revision::new(1));
    }

    #[tokio::test]
    async fn restock_then_purchase_round_trips_quantity() {
        let svc = service();
        let item = svc.create(ladoo(Some(4))).await.unwrap();

        svc.restock(item.id, 5).await.unwrap();
        let after = svc.purchase(item.id, 5).await.unwrap();

        assert_eq!(after.quantity(), 4);
        assert_eq!(after.revision.value(), item.revision.value() + 2);
    }

    #[tokio::test]
    async fn create_defaults_quantity_and_rejects_missing_price() {
        let svc = service();
        let item = svc.create(ladoo(None)).await.unwrap();
        assert_eq!(item.quantity(), 0);

        let err = domain(
            svc.create(ItemSpec {
                price: None,
                ..ladoo(Some(1))
            })
            .await
            .unwrap_err(),
        );
        assert_eq!(err, DomainError::validation("Price is required"));
    }

    #[tokio::test]
    async fn update_keeps_quantity_when_absent() {
        let svc = service();
        let item = svc.create(ladoo(Some(9))).await.unwrap();

        let updated = svc
            .update(
                item.id,
                ItemSpec {
                    name: Some("Motichoor Ladoo".to_string()),
                    ..ladoo(None)
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.fields.name, "Motichoor Ladoo");
        assert_eq!(updated.quantity(), 9);
        assert_eq!(updated.revision, Revision::new(1));
    }

    #[tokio::test]
    async fn missing_item_is_not_found_for_every_mutation() {
        let svc = service();
        let id = ItemId::new();
        let not_found = DomainError::not_found("Item");

        assert_eq!(domain(svc.purchase(id, 1).await.unwrap_err()), not_found);
        assert_eq!(domain(svc.restock(id, 1).await.unwrap_err()), not_found);
        assert_eq!(domain(svc.update(id, ladoo(None)).await.unwrap_err()), not_found);
        assert_eq!(domain(svc.delete(id).await.unwrap_err()), not_found);
    }

    #[tokio::test]
    async fn delete_removes_the_item() {
        let svc = service();
        let item = svc.create(ladoo(Some(1))).await.unwrap();
        svc.delete(item.id).await.unwrap();
        assert!(svc.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_rejects_inverted_price_range() {
        let svc = service();
        let filter = SearchFilter {
            min_price: Some(Price::from_minor_units(500)),
            max_price: Some(Price::from_minor_units(100)),
            ..SearchFilter::default()
        };
        assert!(matches!(
            domain(svc.search(filter).await.unwrap_err()),
            DomainError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn search_combines_criteria() {
        let svc = service();
        svc.create(ladoo(Some(1))).await.unwrap();
        svc.create(ItemSpec {
            name: Some("Kaju Katli".to_string()),
            price: Some("40.00".parse().unwrap()),
            ..ladoo(Some(1))
        })
        .await
        .unwrap();

        let filter = SearchFilter {
            category: Some("indian".to_string()),
            max_price: Some(Price::from_minor_units(3000)),
            ..SearchFilter::default()
        };
        let hits = svc.search(filter).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].fields.name, "Ladoo");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_purchases_of_last_unit_sell_it_once() {
        let svc = Arc::new(service());
        let item = svc.create(ladoo(Some(1))).await.unwrap();

        let a = tokio::spawn({
            let svc = svc.clone();
            async move { svc.purchase(item.id, 1).await }
        });
        let b = tokio::spawn({
            let svc = svc.clone();
            async move { svc.purchase(item.id, 1).await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let failure = results.into_iter().find_map(Result::err).unwrap();
        assert!(matches!(
            domain(failure),
            DomainError::Conflict(_) | DomainError::InsufficientStock { .. }
        ));
        assert_eq!(svc.get(item.id).await.unwrap().quantity(), 0);
    }

    /// Hands out a snapshot, then lets a competing writer commit before the
    /// caller gets to write.
    struct InterleavingStore {
        inner: InMemoryInventoryStore,
    }

    #[async_trait]
    impl InventoryStore for InterleavingStore {
        async fn insert(&self, fields: ItemFields) -> Result<InventoryItem, StoreError> {
            self.inner.insert(fields).await
        }

        async fn get(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
            let snapshot = self.inner.get(id).await?;
            if let Some(item) = &snapshot {
                let competing = item.restocked(1).unwrap();
                self.inner.update_if_revision(id, item.revision, competing).await?;
            }
            Ok(snapshot)
        }

        async fn list(&self) -> Result<Vec<InventoryItem>, StoreError> {
            self.inner.list().await
        }

        async fn search(&self, filter: &SearchFilter) -> Result<Vec<InventoryItem>, StoreError> {
            self.inner.search(filter).await
        }

        async fn update_if_revision(
            &self,
            id: ItemId,
            expected: Revision,
            fields: ItemFields,
        ) -> Result<InventoryItem, StoreError> {
            self.inner.update_if_revision(id, expected, fields).await
        }

        async fn delete_if_revision(&self, id: ItemId, expected: Revision) -> Result<(), StoreError> {
            self.inner.delete_if_revision(id, expected).await
        }
    }

    #[tokio::test]
    async fn lost_race_is_a_conflict_and_not_retried() {
        let svc = InventoryService::new(
            InterleavingStore {
                inner: InMemoryInventoryStore::new(),
            },
            TIMEOUT,
        );
        let item = svc.create(ladoo(Some(5))).await.unwrap();

        let err = domain(svc.purchase(item.id, 2).await.unwrap_err());
        assert!(matches!(err, DomainError::Conflict(_)), "got {err:?}");

        // Only the competing restock landed.
        let stored = svc.store.inner.get(item.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity(), 6);
        assert_eq!(stored.revision, Revision::new(1));
    }
}

//! The favorites store: full offer snapshots saved on this device.

use dealdeck_core::Offer;

use crate::error::StorageError;
use crate::storage::ClientStorage;

/// Storage key for the serialized favorites array. Changing it orphans every
/// saved set.
pub const FAVORITES_KEY: &str = "dealdeck.favorites";

/// An id-unique, insertion-ordered set of saved offers.
///
/// Every mutation re-persists the whole set; if that write fails the
/// in-memory set is rolled back so memory never runs ahead of storage.
#[derive(Debug)]
pub struct FavoritesStore<S> {
    storage: S,
    favorites: Vec<Offer>,
}

impl<S: ClientStorage> FavoritesStore<S> {
    /// Loads the persisted set. Unreadable or malformed data is logged and
    /// replaced by an empty set.
    pub fn hydrate(storage: S) -> Self {
        let favorites = match storage.get(FAVORITES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Offer>>(&raw) {
                Ok(offers) => dedupe(offers),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding malformed favorites data");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read favorites; starting empty");
                Vec::new()
            }
        };
        tracing::debug!(favorite_count = favorites.len(), "favorites hydrated");
        Self { storage, favorites }
    }

    #[must_use]
    pub fn list(&self) -> &[Offer] {
        &self.favorites
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    #[must_use]
    pub fn is_favorite(&self, id: i64) -> bool {
        self.favorites.iter().any(|offer| offer.id == id)
    }

    /// Saves `offer`. Returns `false` without writing if its id is already saved.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the set cannot be persisted.
    pub fn add(&mut self, offer: Offer) -> Result<bool, StorageError> {
        if self.is_favorite(offer.id) {
            return Ok(false);
        }
        self.favorites.push(offer);
        if let Err(e) = self.persist() {
            self.favorites.pop();
            return Err(e);
        }
        Ok(true)
    }

    /// Removes the offer with `id`. Returns `false` without writing if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the set cannot be persisted.
    pub fn remove(&mut self, id: i64) -> Result<bool, StorageError> {
        let Some(index) = self.favorites.iter().position(|offer| offer.id == id) else {
            return Ok(false);
        };
        let removed = self.favorites.remove(index);
        if let Err(e) = self.persist() {
            self.favorites.insert(index, removed);
            return Err(e);
        }
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the empty set cannot be persisted.
    pub fn clear_all(&mut self) -> Result<(), StorageError> {
        let previous = std::mem::take(&mut self.favorites);
        if let Err(e) = self.persist() {
            self.favorites = previous;
            return Err(e);
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&self.favorites).map_err(|source| {
            StorageError::Serialize {
                key: FAVORITES_KEY.to_string(),
                source,
            }
        })?;
        self.storage.set(FAVORITES_KEY, &raw)
    }
}

fn dedupe(offers: Vec<Offer>) -> Vec<Offer> {
    let mut seen = std::collections::HashSet::new();
    offers
        .into_iter()
        .filter(|offer| seen.insert(offer.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use dealdeck_core::{DiscountCode, RegionalVariants};
    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStorage;

    fn offer(id: i64) -> Offer {
        Offer {
            id,
            name: format!("Offer {id}"),
            tags: vec!["AI".to_string()],
            ..Offer::default()
        }
    }

    fn fresh() -> (Arc<MemoryStorage>, FavoritesStore<Arc<MemoryStorage>>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = FavoritesStore::hydrate(Arc::clone(&storage));
        (storage, store)
    }

    #[test]
    fn add_is_idempotent() {
        let (_, mut store) = fresh();
        assert!(store.add(offer(1)).unwrap());
        assert!(!store.add(offer(1)).unwrap());
        assert_eq!(store.len(), 1);
        assert!(store.is_favorite(1));
    }

    #[test]
    fn removing_absent_id_is_a_no_op() {
        let (storage, mut store) = fresh();
        assert!(!store.remove(99).unwrap());
        assert_eq!(storage.get(FAVORITES_KEY).unwrap(), None);
    }

    #[test]
    fn rehydrating_reproduces_the_set_after_every_mutation() {
        let (storage, mut store) = fresh();
        let mut rich = offer(3);
        rich.has_alt_links = true;
        rich.alt_links = RegionalVariants::from_value(&json!({
            "US": {"url": "https://example.com/us", "offer_text": "6 months"}
        }));
        rich.has_discount_codes = true;
        rich.discount_codes = Some(vec![DiscountCode {
            code: "SAVE".to_string(),
            description: None,
        }]);

        store.add(offer(1)).unwrap();
        store.add(offer(2)).unwrap();
        store.add(rich).unwrap();
        store.remove(2).unwrap();

        let reloaded = FavoritesStore::hydrate(Arc::clone(&storage));
        assert_eq!(reloaded.list(), store.list());

        store.clear_all().unwrap();
        let reloaded = FavoritesStore::hydrate(Arc::clone(&storage));
        assert!(reloaded.is_empty());
    }

    #[test]
    fn malformed_data_hydrates_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(FAVORITES_KEY, "{not json").unwrap();
        let store = FavoritesStore::hydrate(Arc::clone(&storage));
        assert!(store.is_empty());
    }

    #[test]
    fn offer_with_all_regional_entries_dropped_rehydrates_identically() {
        let row: dealdeck_core::RawOfferRow = serde_json::from_value(json!({
            "id": 9,
            "has_alt_links": 1,
            "alt_links": {"US": {"url": 5, "offer_text": "free"}}
        }))
        .unwrap();
        let normalized = crate::normalize::normalize_row(row);

        let (storage, mut store) = fresh();
        store.add(normalized).unwrap();

        let reloaded = FavoritesStore::hydrate(Arc::clone(&storage));
        assert_eq!(reloaded.list(), store.list());
    }

    #[test]
    fn duplicate_ids_in_storage_collapse_on_hydrate() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(FAVORITES_KEY, r#"[{"id":1,"name":"a"},{"id":1,"name":"b"}]"#)
            .unwrap();
        let store = FavoritesStore::hydrate(storage);
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].name, "a");
    }

    struct FlakyStorage {
        inner: MemoryStorage,
        fail: AtomicBool,
    }

    impl ClientStorage for FlakyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StorageError::Io {
                    key: key.to_string(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn failed_write_rolls_back_memory() {
        let storage = Arc::new(FlakyStorage {
            inner: MemoryStorage::new(),
            fail: AtomicBool::new(false),
        });
        let mut store = FavoritesStore::hydrate(Arc::clone(&storage));
        store.add(offer(1)).unwrap();

        storage.fail.store(true, Ordering::SeqCst);
        assert!(store.add(offer(2)).is_err());
        assert!(store.remove(1).is_err());
        assert!(store.clear_all().is_err());
        let ids: Vec<_> = store.list().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1]);
    }
}

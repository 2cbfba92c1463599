//! The preload snapshot: normalized offers prepared before any feed asks for
//! them, so the first read can skip the store.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use dealdeck_core::{Offer, OFFER_ROW_LIMIT};

use crate::error::CatalogError;
use crate::normalize::normalize_rows;
use crate::source::OfferSource;

/// Normalized, unfiltered offers and when they were prepared.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub offers: Arc<Vec<Offer>>,
    pub prepared_at: DateTime<Utc>,
}

/// Shared slot holding at most one [`Snapshot`]. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct PreloadSnapshot {
    slot: Arc<RwLock<Option<Snapshot>>>,
}

impl PreloadSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the slot contents with `offers`.
    pub fn store(&self, offers: Vec<Offer>) -> Snapshot {
        let snapshot = Snapshot {
            offers: Arc::new(offers),
            prepared_at: Utc::now(),
        };
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        snapshot
    }

    #[must_use]
    pub fn get(&self) -> Option<Snapshot> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A snapshot worth adopting: present and non-empty.
    #[must_use]
    pub fn usable(&self) -> Option<Snapshot> {
        self.get().filter(|snapshot| !snapshot.offers.is_empty())
    }

    /// Clears the slot. Returns `true` if a snapshot was present.
    pub fn invalidate(&self) -> bool {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    /// Reads and normalizes the full catalog from `source` and stores it.
    ///
    /// # Errors
    ///
    /// Returns any [`CatalogError`] from the source; the slot is left unchanged.
    pub async fn prepare<S: OfferSource>(&self, source: &S) -> Result<Snapshot, CatalogError> {
        let rows = source.fetch_rows(OFFER_ROW_LIMIT).await?;
        let snapshot = self.store(normalize_rows(rows));
        tracing::info!(
            offer_count = snapshot.offers.len(),
            "preload snapshot prepared"
        );
        Ok(snapshot)
    }
}

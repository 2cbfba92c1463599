//! The offer fetch controller.
//!
//! Each refresh runs preload check, fetch, normalize, region filter, publish.
//! Refreshes are numbered; a result is published only when it is newer than
//! the last published one, so a slow earlier fetch can never overwrite a
//! later one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dealdeck_core::{apply_region_exclusion, ExclusionRule, GeoState, Offer, OFFER_ROW_LIMIT};
use tokio::sync::watch;

use crate::cancel::CancellationToken;
use crate::error::CatalogError;
use crate::normalize::normalize_rows;
use crate::snapshot::PreloadSnapshot;
use crate::source::OfferSource;

/// What consumers see: the visible offers, whether a refresh is pending, and
/// the last refresh error.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub offers: Arc<Vec<Offer>>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Refresh number that produced `offers`; `0` before the first one lands.
    pub generation: u64,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            offers: Arc::new(Vec::new()),
            is_loading: true,
            error: None,
            generation: 0,
        }
    }
}

#[derive(Debug)]
pub struct OfferFeed<S> {
    source: Arc<S>,
    snapshot: PreloadSnapshot,
    rules: Vec<ExclusionRule>,
    geo: watch::Receiver<GeoState>,
    state: watch::Sender<FeedState>,
    issued: AtomicU64,
    cancel: CancellationToken,
}

impl<S: OfferSource> OfferFeed<S> {
    #[must_use]
    pub fn new(
        source: Arc<S>,
        snapshot: PreloadSnapshot,
        rules: Vec<ExclusionRule>,
        geo: watch::Receiver<GeoState>,
    ) -> Self {
        let (state, _rx) = watch::channel(FeedState::default());
        Self {
            source,
            snapshot,
            rules,
            geo,
            state,
            issued: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops publishing. Refreshes already in flight finish but their results
    /// are dropped.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        self.state.send_modify(|state| state.is_loading = false);
        tracing::debug!("offer feed shut down");
    }

    /// Re-runs the full fetch sequence against the current geolocation and
    /// returns the state afterwards.
    ///
    /// Never fails: a read error is published as `error` with no offers.
    pub async fn refresh(&self) -> FeedState {
        if self.cancel.is_cancelled() {
            return self.state();
        }

        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| state.is_loading = true);

        let geo = self.geo.borrow().clone();
        let result = self.load(&geo).await;

        if self.cancel.is_cancelled() {
            tracing::debug!(generation, "discarding refresh result after shutdown");
            return self.state();
        }

        let issued = &self.issued;
        self.state.send_if_modified(|state| {
            if generation <= state.generation {
                tracing::debug!(
                    generation,
                    applied = state.generation,
                    "discarding stale refresh result"
                );
                return false;
            }

            match result {
                Ok(offers) => {
                    tracing::debug!(generation, offer_count = offers.len(), "offers refreshed");
                    state.offers = Arc::new(offers);
                    state.error = None;
                }
                Err(e) => {
                    tracing::warn!(generation, error = %e, "offer refresh failed");
                    state.offers = Arc::new(Vec::new());
                    state.error = Some(e.to_string());
                }
            }
            state.generation = generation;
            state.is_loading = issued.load(Ordering::SeqCst) > generation;
            true
        });

        self.state()
    }

    /// Refreshes now and again every time the geolocation changes, until
    /// [`OfferFeed::shutdown`] is called or the geolocation sender is gone.
    pub async fn run(&self) {
        let mut geo = self.geo.clone();
        loop {
            drop(geo.borrow_and_update());
            self.refresh().await;

            tokio::select! {
                () = self.cancel.cancelled() => break,
                changed = geo.changed() => {
                    if changed.is_err() {
                        tracing::debug!("geolocation channel closed; offer feed stops following it");
                        break;
                    }
                }
            }
        }
    }

    async fn load(&self, geo: &GeoState) -> Result<Vec<Offer>, CatalogError> {
        let offers = if let Some(snapshot) = self.snapshot.usable() {
            tracing::debug!(
                offer_count = snapshot.offers.len(),
                "adopting preload snapshot"
            );
            snapshot.offers.as_ref().clone()
        } else {
            let rows = self.source.fetch_rows(OFFER_ROW_LIMIT).await?;
            normalize_rows(rows)
        };

        Ok(apply_region_exclusion(offers, geo, &self.rules))
    }
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;

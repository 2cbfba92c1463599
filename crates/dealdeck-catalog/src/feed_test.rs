use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use dealdeck_core::{default_exclusion_rules, CountryCode, RawOfferRow};
use tokio::sync::oneshot;

use super::*;
use crate::source::StaticOfferSource;

type RowsResult = Result<Vec<RawOfferRow>, CatalogError>;

fn row(id: i64, name: &str) -> RawOfferRow {
    RawOfferRow {
        id,
        name: Some(name.to_string()),
        ..RawOfferRow::default()
    }
}

fn resolved(code: &str) -> GeoState {
    GeoState::Resolved(CountryCode::parse(code).unwrap())
}

fn ids(state: &FeedState) -> Vec<i64> {
    state.offers.iter().map(|o| o.id).collect()
}

fn feed_over<S: OfferSource>(source: S, geo: GeoState) -> OfferFeed<S> {
    let (_tx, rx) = watch::channel(geo);
    OfferFeed::new(
        Arc::new(source),
        PreloadSnapshot::new(),
        default_exclusion_rules(),
        rx,
    )
}

struct FailingSource;

impl OfferSource for FailingSource {
    async fn fetch_rows(&self, _limit: u32) -> RowsResult {
        Err(CatalogError::UnexpectedStatus {
            status: 503,
            url: "http://store.invalid/offers".to_string(),
        })
    }
}

/// Each fetch waits on the next queued gate, so tests decide completion order.
#[derive(Default)]
struct GatedSource {
    gates: Mutex<VecDeque<oneshot::Receiver<RowsResult>>>,
}

impl GatedSource {
    fn gate(&self) -> oneshot::Sender<RowsResult> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }
}

impl OfferSource for GatedSource {
    async fn fetch_rows(&self, _limit: u32) -> RowsResult {
        let gate = {
            let mut gates = self.gates.lock().unwrap();
            gates.pop_front().expect("a gate per fetch")
        };
        gate.await.expect("gate released")
    }
}

#[test]
fn initial_state_is_loading_and_empty() {
    let feed = feed_over(StaticOfferSource::default(), GeoState::Unresolved);
    let state = feed.state();
    assert!(state.is_loading);
    assert!(state.offers.is_empty());
    assert_eq!(state.generation, 0);
}

#[tokio::test]
async fn empty_store_is_a_valid_empty_result() {
    let feed = feed_over(StaticOfferSource::default(), resolved("US"));
    let state = feed.refresh().await;
    assert!(state.offers.is_empty());
    assert!(!state.is_loading);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn read_failure_exposes_error_and_no_offers() {
    let feed = feed_over(FailingSource, resolved("US"));
    let state = feed.refresh().await;
    assert!(state.offers.is_empty());
    assert!(!state.is_loading);
    let error = state.error.expect("error surfaced");
    assert!(error.contains("503"), "error was: {error}");
}

#[tokio::test]
async fn success_after_failure_clears_error() {
    let source = GatedSource::default();
    let first = source.gate();
    let second = source.gate();
    let feed = feed_over(source, resolved("US"));

    first
        .send(Err(CatalogError::NoSourceConfigured))
        .unwrap_or_else(|_| panic!("receiver alive"));
    assert!(feed.refresh().await.error.is_some());

    second
        .send(Ok(vec![row(1, "Notion")]))
        .unwrap_or_else(|_| panic!("receiver alive"));
    let state = feed.refresh().await;
    assert_eq!(state.error, None);
    assert_eq!(ids(&state), vec![1]);
}

#[tokio::test]
async fn usable_snapshot_skips_the_source() {
    let snapshot = PreloadSnapshot::new();
    snapshot.store(vec![Offer {
        id: 42,
        name: "Preloaded".to_string(),
        ..Offer::default()
    }]);
    let (_tx, rx) = watch::channel(resolved("US"));
    let feed = OfferFeed::new(
        Arc::new(FailingSource),
        snapshot,
        default_exclusion_rules(),
        rx,
    );

    let state = feed.refresh().await;
    assert_eq!(state.error, None);
    assert_eq!(ids(&state), vec![42]);
}

#[tokio::test]
async fn empty_snapshot_falls_back_to_the_source() {
    let snapshot = PreloadSnapshot::new();
    snapshot.store(Vec::new());
    let (_tx, rx) = watch::channel(resolved("US"));
    let feed = OfferFeed::new(
        Arc::new(StaticOfferSource::new(vec![row(7, "Figma")])),
        snapshot,
        default_exclusion_rules(),
        rx,
    );
    assert_eq!(ids(&feed.refresh().await), vec![7]);
}

#[tokio::test]
async fn region_exclusive_offer_only_reaches_its_country() {
    let rows = vec![row(1, "Perplexity Pro via Airtel"), row(2, "GitHub Copilot")];

    let india = feed_over(StaticOfferSource::new(rows.clone()), resolved("IN"));
    assert_eq!(ids(&india.refresh().await), vec![1, 2]);

    for country in ["US", "GB", "BR"] {
        let feed = feed_over(StaticOfferSource::new(rows.clone()), resolved(country));
        assert_eq!(ids(&feed.refresh().await), vec![2], "country {country}");
    }
}

#[tokio::test]
async fn unresolved_geo_is_fail_open() {
    let rows = vec![row(1, "perplexity x airtel")];
    for geo in [GeoState::Unresolved, GeoState::Resolving] {
        let feed = feed_over(StaticOfferSource::new(rows.clone()), geo);
        assert_eq!(ids(&feed.refresh().await), vec![1]);
    }
}

#[tokio::test]
async fn stale_result_does_not_overwrite_newer_one() {
    let source = GatedSource::default();
    let slow = source.gate();
    let fast = source.gate();
    let feed = feed_over(source, resolved("US"));
    let mut watcher = feed.subscribe();

    let (first, second, ()) = tokio::join!(feed.refresh(), feed.refresh(), async {
        fast.send(Ok(vec![row(2, "newer")]))
            .unwrap_or_else(|_| panic!("receiver alive"));
        watcher.wait_for(|s| s.generation == 2).await.unwrap();
        slow.send(Ok(vec![row(1, "older")]))
            .unwrap_or_else(|_| panic!("receiver alive"));
    });

    assert_eq!(second.generation, 2);
    assert_eq!(first.generation, 2, "older refresh sees the newer state");
    let state = feed.state();
    assert_eq!(ids(&state), vec![2]);
    assert!(!state.is_loading);
}

#[tokio::test]
async fn shutdown_discards_in_flight_result() {
    let source = GatedSource::default();
    let gate = source.gate();
    let feed = feed_over(source, resolved("US"));

    let (state, ()) = tokio::join!(feed.refresh(), async {
        feed.shutdown();
        gate.send(Ok(vec![row(1, "late")]))
            .unwrap_or_else(|_| panic!("receiver alive"));
    });

    assert!(state.offers.is_empty());
    assert_eq!(state.generation, 0);
    assert!(!state.is_loading);

    // Further refreshes are no-ops.
    assert_eq!(feed.refresh().await.generation, 0);
}

#[tokio::test]
async fn run_refetches_when_geolocation_changes() {
    let (geo_tx, geo_rx) = watch::channel(GeoState::Unresolved);
    let feed = Arc::new(OfferFeed::new(
        Arc::new(StaticOfferSource::new(vec![
            row(1, "Perplexity + Airtel"),
            row(2, "Vercel Pro"),
        ])),
        PreloadSnapshot::new(),
        default_exclusion_rules(),
        geo_rx,
    ));
    let mut states = feed.subscribe();

    let runner = {
        let feed = Arc::clone(&feed);
        tokio::spawn(async move { feed.run().await })
    };

    states.wait_for(|s| s.generation >= 1).await.unwrap();
    assert_eq!(ids(&feed.state()), vec![1, 2]);

    geo_tx.send_replace(resolved("US"));
    let state = states
        .wait_for(|s| s.generation >= 2)
        .await
        .unwrap()
        .clone();
    assert_eq!(ids(&state), vec![2]);

    feed.shutdown();
    tokio::time::timeout(Duration::from_secs(1), runner)
        .await
        .expect("run stops after shutdown")
        .expect("run task does not panic");
}

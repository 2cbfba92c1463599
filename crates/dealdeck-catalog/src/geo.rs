//! Session geolocation: one probe, a fallback country on failure, and a
//! watch channel consumers subscribe to.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dealdeck_core::{CountryCode, GeoState};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::CatalogError;

/// Looks up the visitor's country.
///
/// `Ok(None)` means the probe answered but had no usable code.
pub trait GeoProbe: Send + Sync {
    fn probe(&self) -> impl Future<Output = Result<Option<CountryCode>, CatalogError>> + Send;
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    country_code: Option<String>,
}

/// Probe that calls a `{ "country_code": "XX" }` endpoint.
#[derive(Debug, Clone)]
pub struct HttpGeoProbe {
    client: Client,
    url: String,
}

impl HttpGeoProbe {
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl GeoProbe for HttpGeoProbe {
    async fn probe(&self) -> Result<Option<CountryCode>, CatalogError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.text().await?;
        let parsed: GeoResponse =
            serde_json::from_str(&body).map_err(|e| CatalogError::Deserialize {
                context: "geolocation response".to_string(),
                source: e,
            })?;

        let Some(raw) = parsed.country_code else {
            return Ok(None);
        };
        match CountryCode::parse(&raw) {
            Ok(code) => Ok(Some(code)),
            Err(e) => {
                tracing::warn!(error = %e, "geolocation probe returned an unusable country code");
                Ok(None)
            }
        }
    }
}

/// Session-scoped geolocation state.
///
/// `Unresolved -> Resolving -> Resolved(code)`. The probe runs at most once
/// per context; a failed or empty probe resolves to the configured fallback.
#[derive(Debug)]
pub struct GeoContext<P> {
    probe: P,
    fallback: CountryCode,
    state: watch::Sender<GeoState>,
    started: AtomicBool,
}

impl<P: GeoProbe> GeoContext<P> {
    #[must_use]
    pub fn new(probe: P, fallback: CountryCode) -> Self {
        let (state, _rx) = watch::channel(GeoState::Unresolved);
        Self {
            probe,
            fallback,
            state,
            started: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn state(&self) -> GeoState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<GeoState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn fallback(&self) -> &CountryCode {
        &self.fallback
    }

    /// Runs the probe on the first call and returns the resolved state.
    ///
    /// Later calls never probe again; they wait for the first call to settle.
    pub async fn resolve(&self) -> GeoState {
        if self.started.swap(true, Ordering::SeqCst) {
            let mut rx = self.subscribe();
            return match rx.wait_for(GeoState::is_resolved).await {
                Ok(state) => state.clone(),
                Err(_) => self.state(),
            };
        }

        self.state.send_replace(GeoState::Resolving);

        let code = match self.probe.probe().await {
            Ok(Some(code)) => {
                tracing::info!(country_code = %code, "geolocation resolved");
                code
            }
            Ok(None) => {
                tracing::warn!(
                    country_code = %self.fallback,
                    "geolocation probe returned no country; using fallback"
                );
                self.fallback.clone()
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    country_code = %self.fallback,
                    "geolocation probe failed; using fallback"
                );
                self.fallback.clone()
            }
        };

        let resolved = GeoState::Resolved(code);
        self.state.send_replace(resolved.clone());
        resolved
    }
}

impl<P: GeoProbe + 'static> GeoContext<P> {
    /// Starts [`GeoContext::resolve`] on the runtime without waiting for it.
    pub fn spawn_resolve(self: &Arc<Self>) -> JoinHandle<GeoState> {
        let ctx = Arc::clone(self);
        tokio::spawn(async move { ctx.resolve().await })
    }
}

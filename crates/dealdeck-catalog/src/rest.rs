//! Offer source backed by a PostgREST endpoint exposing the `offers` table.

use std::time::Duration;

use dealdeck_core::{RawOfferRow, OFFER_COLUMNS};
use reqwest::{Client, Url};

use crate::error::CatalogError;
use crate::source::OfferSource;

/// HTTP client for `GET {base}/offers?select=...&order=id.asc&limit=N`.
#[derive(Clone)]
pub struct RestOfferSource {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl std::fmt::Debug for RestOfferSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestOfferSource")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish_non_exhaustive()
    }
}

impl RestOfferSource {
    /// Creates a source pointed at `base_url` (e.g. `https://host/rest/v1`).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`CatalogError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `join("offers")` appends rather than
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| CatalogError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.map(ToOwned::to_owned),
        })
    }

    fn rows_url(&self, limit: u32) -> Result<Url, CatalogError> {
        let mut url = self
            .base_url
            .join("offers")
            .map_err(|e| CatalogError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("select", &OFFER_COLUMNS.join(","))
            .append_pair("order", "id.asc")
            .append_pair("limit", &limit.to_string());
        Ok(url)
    }
}

impl OfferSource for RestOfferSource {
    async fn fetch_rows(&self, limit: u32) -> Result<Vec<RawOfferRow>, CatalogError> {
        let url = self.rows_url(limit)?;

        let mut request = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let values: Vec<serde_json::Value> =
            serde_json::from_str(&body).map_err(|e| CatalogError::Deserialize {
                context: "offers rows".to_string(),
                source: e,
            })?;

        // A row without an integer id has no identity; everything else is
        // accepted as-is.
        let rows = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                match serde_json::from_value::<RawOfferRow>(value) {
                    Ok(row) => Some(row),
                    Err(e) => {
                        tracing::warn!(index, error = %e, "skipping offer row without a usable id");
                        None
                    }
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(row_count = rows.len(), "fetched offer rows over rest");
        Ok(rows)
    }
}

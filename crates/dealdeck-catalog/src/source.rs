//! Backing-store read contract and its implementations.

use std::future::Future;

use dealdeck_core::{AppConfig, RawOfferRow};
use sqlx::PgPool;

use crate::error::CatalogError;
use crate::rest::RestOfferSource;

/// Something that can return the catalog's raw offer rows.
///
/// Implementations return rows ordered by id ascending, at most `limit` of them.
pub trait OfferSource: Send + Sync {
    fn fetch_rows(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<RawOfferRow>, CatalogError>> + Send;
}

/// Reads offers straight from Postgres.
#[derive(Debug, Clone)]
pub struct PgOfferSource {
    pool: PgPool,
}

impl PgOfferSource {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl OfferSource for PgOfferSource {
    async fn fetch_rows(&self, limit: u32) -> Result<Vec<RawOfferRow>, CatalogError> {
        Ok(dealdeck_db::fetch_offer_rows(&self.pool, limit).await?)
    }
}

/// A fixed set of rows, used for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticOfferSource {
    rows: Vec<RawOfferRow>,
}

impl StaticOfferSource {
    #[must_use]
    pub fn new(mut rows: Vec<RawOfferRow>) -> Self {
        rows.sort_by_key(|row| row.id);
        Self { rows }
    }
}

impl OfferSource for StaticOfferSource {
    async fn fetch_rows(&self, limit: u32) -> Result<Vec<RawOfferRow>, CatalogError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self.rows.iter().take(limit).cloned().collect())
    }
}

/// The source selected by configuration: Postgres when `DATABASE_URL` is
/// set, PostgREST otherwise.
#[derive(Debug)]
pub enum ConfiguredSource {
    Postgres(PgOfferSource),
    Rest(RestOfferSource),
}

impl ConfiguredSource {
    /// Builds the configured source, connecting the pool when Postgres is used.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Db`] if the pool cannot connect,
    /// [`CatalogError::Http`] / [`CatalogError::InvalidUrl`] if the REST
    /// client cannot be built, or [`CatalogError::NoSourceConfigured`].
    pub async fn from_config(config: &AppConfig) -> Result<Self, CatalogError> {
        if let Some(database_url) = &config.database_url {
            let pool_config = dealdeck_db::PoolConfig::from_app_config(config);
            let pool = dealdeck_db::connect_pool(database_url, pool_config)
                .await
                .map_err(dealdeck_db::DbError::from)?;
            tracing::info!("using postgres offer source");
            return Ok(Self::Postgres(PgOfferSource::new(pool)));
        }

        if let Some(rest_url) = &config.rest_url {
            let source = RestOfferSource::new(
                rest_url,
                config.rest_api_key.as_deref(),
                config.request_timeout_secs,
                &config.user_agent,
            )?;
            tracing::info!(rest_url = %rest_url, "using postgrest offer source");
            return Ok(Self::Rest(source));
        }

        Err(CatalogError::NoSourceConfigured)
    }
}

impl OfferSource for ConfiguredSource {
    async fn fetch_rows(&self, limit: u32) -> Result<Vec<RawOfferRow>, CatalogError> {
        match self {
            Self::Postgres(source) => source.fetch_rows(limit).await,
            Self::Rest(source) => source.fetch_rows(limit).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64) -> RawOfferRow {
        RawOfferRow {
            id,
            ..RawOfferRow::default()
        }
    }

    #[tokio::test]
    async fn static_source_orders_by_id_and_applies_limit() {
        let source = StaticOfferSource::new(vec![row(3), row(1), row(2)]);
        let rows = source.fetch_rows(2).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn static_source_empty_is_ok() {
        let source = StaticOfferSource::default();
        assert!(source.fetch_rows(5000).await.unwrap().is_empty());
    }
}

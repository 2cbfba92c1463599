//! Read access to the `offers` table.

use dealdeck_core::{LooseBool, RawOfferRow, OFFER_COLUMNS};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `offers` table, restricted to the catalog projection.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferRow {
    pub id: i64,
    pub name: Option<String>,
    pub offer: Option<String>,
    pub description: Option<String>,
    pub claim_url: Option<String>,
    pub logo: Option<String>,
    pub location: Option<String>,
    pub github_offer: Option<bool>,
    pub is_hidden_gem: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_underrated: Option<bool>,
    pub has_details_modal: Option<bool>,
    pub has_alt_links: Option<bool>,
    pub alt_links: Option<serde_json::Value>,
    pub has_discount_codes: Option<bool>,
    pub discount_codes: Option<serde_json::Value>,
    pub extra_info: Option<String>,
    pub urgency_badge: Option<String>,
    pub tag1: Option<String>,
    pub tag2: Option<String>,
    pub tag3: Option<String>,
    pub category_main: Option<String>,
    pub category_sub: Option<String>,
}

impl From<OfferRow> for RawOfferRow {
    fn from(row: OfferRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            offer: row.offer,
            description: row.description,
            claim_url: row.claim_url,
            logo: row.logo,
            location: row.location,
            github_offer: row.github_offer.map(LooseBool::from),
            is_hidden_gem: row.is_hidden_gem.map(LooseBool::from),
            is_featured: row.is_featured.map(LooseBool::from),
            is_underrated: row.is_underrated.map(LooseBool::from),
            has_details_modal: row.has_details_modal.map(LooseBool::from),
            has_alt_links: row.has_alt_links.map(LooseBool::from),
            alt_links: row.alt_links,
            has_discount_codes: row.has_discount_codes.map(LooseBool::from),
            discount_codes: row.discount_codes,
            extra_info: row.extra_info,
            urgency_badge: row.urgency_badge,
            tag1: row.tag1,
            tag2: row.tag2,
            tag3: row.tag3,
            category_main: row.category_main,
            category_sub: row.category_sub,
        }
    }
}

/// `SELECT` statement for the catalog projection, ordered by id, capped by `$1`.
#[must_use]
pub fn offer_select_sql() -> String {
    format!(
        "SELECT {} FROM offers ORDER BY id ASC LIMIT $1",
        OFFER_COLUMNS.join(", ")
    )
}

/// Fetch up to `limit` offer rows in ascending id order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_offer_rows(pool: &PgPool, limit: u32) -> Result<Vec<RawOfferRow>, DbError> {
    let rows = sqlx::query_as::<_, OfferRow>(&offer_select_sql())
        .bind(i64::from(limit))
        .fetch_all(pool)
        .await?;

    tracing::debug!(row_count = rows.len(), limit, "fetched offer rows");

    Ok(rows.into_iter().map(RawOfferRow::from).collect())
}

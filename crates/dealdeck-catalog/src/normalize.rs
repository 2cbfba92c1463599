//! Normalization from raw store rows to [`dealdeck_core::Offer`].
//!
//! The normalizer never rejects a row: it collapses the three tag columns,
//! coerces flag columns to strict booleans and decides the regional-variant
//! format once. Field values are otherwise passed through untouched.

use dealdeck_core::{DiscountCode, LooseBool, Offer, RawOfferRow, RegionalVariants};

/// Normalizes one raw row.
#[must_use]
pub fn normalize_row(row: RawOfferRow) -> Offer {
    let tags = collapse_tags([row.tag1, row.tag2, row.tag3]);

    let alt_links = row.alt_links.as_ref().and_then(RegionalVariants::from_value);
    let discount_codes = row
        .discount_codes
        .as_ref()
        .and_then(DiscountCode::list_from_value);

    Offer {
        id: row.id,
        name: row.name.unwrap_or_default(),
        offer: row.offer.unwrap_or_default(),
        description: row.description.unwrap_or_default(),
        claim_url: row.claim_url.unwrap_or_default(),
        logo: row.logo.unwrap_or_default(),
        location: row.location.unwrap_or_default(),
        tags,
        github_offer: flag(row.github_offer.as_ref()),
        is_hidden_gem: flag(row.is_hidden_gem.as_ref()),
        is_featured: flag(row.is_featured.as_ref()),
        is_underrated: flag(row.is_underrated.as_ref()),
        has_details_modal: flag(row.has_details_modal.as_ref()),
        has_alt_links: flag(row.has_alt_links.as_ref()),
        alt_links,
        has_discount_codes: flag(row.has_discount_codes.as_ref()),
        discount_codes,
        extra_info: row.extra_info,
        urgency_badge: row.urgency_badge,
        category_main: row.category_main,
        category_sub: row.category_sub,
    }
}

/// Normalizes a batch of rows, preserving order.
#[must_use]
pub fn normalize_rows(rows: Vec<RawOfferRow>) -> Vec<Offer> {
    rows.into_iter().map(normalize_row).collect()
}

fn flag(value: Option<&LooseBool>) -> bool {
    value.is_some_and(LooseBool::truthy)
}

/// Keeps non-null, non-empty tags in column order.
fn collapse_tags(columns: [Option<String>; 3]) -> Vec<String> {
    columns
        .into_iter()
        .flatten()
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

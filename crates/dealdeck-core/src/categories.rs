//! Categories derived from the offer collection itself. There is no category
//! table; identity is a slug computed from `category_main`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::offers::Offer;

/// Icon used when a category name has no entry in [`CATEGORY_ICONS`].
pub const DEFAULT_ICON: &str = "tag";

/// Display name to icon identifier.
const CATEGORY_ICONS: &[(&str, &str)] = &[
    ("All", "grid"),
    ("GitHub Student Pack", "github"),
    ("AI Tools", "sparkles"),
    ("Developer Tools", "code"),
    ("Cloud & Hosting", "cloud"),
    ("Design", "palette"),
    ("Productivity", "check-square"),
    ("Education", "graduation-cap"),
    ("Entertainment", "film"),
    ("Music", "music"),
    ("Finance", "wallet"),
    ("Shopping", "shopping-bag"),
    ("Travel", "plane"),
    ("Food & Dining", "utensils"),
    ("Security", "shield"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Normalized slug, e.g. `"ai-tools"`.
    pub id: String,
    pub name: String,
    pub icon: String,
    pub count: usize,
}

/// An entry of the pre-declared navigation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCategory {
    pub id: &'static str,
    pub name: &'static str,
}

/// Stable-order navigation categories.
///
/// `all` matches every offer and `github` matches the developer-pack flag;
/// every other id matches by slug of `category_main`.
pub const FIXED_CATEGORIES: &[FixedCategory] = &[
    FixedCategory { id: "all", name: "All" },
    FixedCategory { id: "github", name: "GitHub Student Pack" },
    FixedCategory { id: "ai-tools", name: "AI Tools" },
    FixedCategory { id: "developer-tools", name: "Developer Tools" },
    FixedCategory { id: "cloud-and-hosting", name: "Cloud & Hosting" },
    FixedCategory { id: "design", name: "Design" },
    FixedCategory { id: "productivity", name: "Productivity" },
    FixedCategory { id: "education", name: "Education" },
    FixedCategory { id: "entertainment", name: "Entertainment" },
    FixedCategory { id: "finance", name: "Finance" },
    FixedCategory { id: "shopping", name: "Shopping" },
    FixedCategory { id: "travel", name: "Travel" },
];

/// Slug for a category display name.
///
/// Lowercases, replaces `&` with `and`, strips everything except ASCII
/// alphanumerics, whitespace and hyphens, turns whitespace into hyphens and
/// collapses hyphen runs.
#[must_use]
pub fn category_slug(name: &str) -> String {
    let lowered = name.trim().to_lowercase().replace('&', "and");
    let mut slug = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' {
            if !slug.ends_with('-') {
                slug.push('-');
            }
        } else if c.is_ascii_alphanumeric() {
            slug.push(c);
        }
    }
    slug
}

/// Icon identifier for a category display name.
#[must_use]
pub fn category_icon(name: &str) -> &'static str {
    CATEGORY_ICONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name.trim()))
        .map_or(DEFAULT_ICON, |(_, icon)| icon)
}

/// Structural match between an offer and a category id.
#[must_use]
pub fn matches_category(offer: &Offer, category_id: &str) -> bool {
    match category_id {
        "all" => true,
        "github" => offer.github_offer,
        id => offer
            .category_main
            .as_deref()
            .is_some_and(|main| category_slug(main) == id),
    }
}

/// Distinct categories present in `offers`, sorted by slug, with counts.
///
/// When two display names normalize to the same slug the first one seen
/// names the category; counts still include both.
#[must_use]
pub fn derive_categories(offers: &[Offer]) -> Vec<Category> {
    let mut by_slug: BTreeMap<String, (String, usize)> = BTreeMap::new();

    for offer in offers {
        let Some(main) = offer.category_main.as_deref() else {
            continue;
        };
        let slug = category_slug(main);
        if slug.is_empty() {
            continue;
        }
        by_slug
            .entry(slug)
            .or_insert_with(|| (main.trim().to_string(), 0))
            .1 += 1;
    }

    by_slug
        .into_iter()
        .map(|(id, (name, count))| Category {
            icon: category_icon(&name).to_string(),
            id,
            name,
            count,
        })
        .collect()
}

/// Counts for each entry of `fixed`, in the order given.
#[must_use]
pub fn count_fixed_categories(offers: &[Offer], fixed: &[FixedCategory]) -> Vec<Category> {
    fixed
        .iter()
        .map(|category| Category {
            id: category.id.to_string(),
            name: category.name.to_string(),
            icon: category_icon(category.name).to_string(),
            count: offers
                .iter()
                .filter(|offer| matches_category(offer, category.id))
                .count(),
        })
        .collect()
}

/// Offers belonging to `category_id`, in input order.
#[must_use]
pub fn offers_in_category<'a>(offers: &'a [Offer], category_id: &str) -> Vec<&'a Offer> {
    offers
        .iter()
        .filter(|offer| matches_category(offer, category_id))
        .collect()
}

/// Distinct, sorted subcategory names among offers of `category_id`.
#[must_use]
pub fn derive_subcategories(offers: &[Offer], category_id: &str) -> Vec<String> {
    offers
        .iter()
        .filter(|offer| matches_category(offer, category_id))
        .filter_map(|offer| offer.category_sub.as_deref())
        .map(str::trim)
        .filter(|sub| !sub.is_empty())
        .map(ToOwned::to_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
#[path = "categories_test.rs"]
mod tests;

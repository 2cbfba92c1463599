//! Regional variant access and the region-exclusion policy.

use serde::{Deserialize, Serialize};

use crate::offers::{Offer, RegionalDeal};
use crate::CoreError;

/// Upper-case ISO-3166 alpha-2 country code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    /// Parses and upper-cases a two-letter code.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCountryCode`] unless the trimmed input is
    /// exactly two ASCII letters.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err(CoreError::InvalidCountryCode(raw.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

/// Visitor geolocation for the current session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GeoState {
    #[default]
    Unresolved,
    Resolving,
    Resolved(CountryCode),
}

impl GeoState {
    /// The resolved country, or `None` while unresolved or resolving.
    #[must_use]
    pub fn country(&self) -> Option<&CountryCode> {
        match self {
            Self::Resolved(code) => Some(code),
            Self::Unresolved | Self::Resolving => None,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// `true` iff the offer is flagged for alternate links and has at least one variant.
#[must_use]
pub fn has_regional_offers(offer: &Offer) -> bool {
    offer.has_alt_links && offer.alt_links.as_ref().is_some_and(|v| !v.is_empty())
}

/// Structured variant for `country_code`.
///
/// Legacy bare-URL maps never resolve here; use [`variant_url`] when only the
/// claim URL is needed.
#[must_use]
pub fn resolve_variant<'a>(offer: &'a Offer, country_code: &str) -> Option<&'a RegionalDeal> {
    offer.alt_links.as_ref()?.structured(country_code)
}

/// Claim URL for `country_code` from either variant format.
#[must_use]
pub fn variant_url<'a>(offer: &'a Offer, country_code: &str) -> Option<&'a str> {
    offer.alt_links.as_ref()?.url(country_code)
}

/// Variant country codes in source order; empty when the offer has none.
#[must_use]
pub fn list_available_countries(offer: &Offer) -> Vec<&str> {
    offer
        .alt_links
        .as_ref()
        .map(|variants| variants.country_codes())
        .unwrap_or_default()
}

/// An offer exclusive to one country, identified by name.
///
/// The rule matches when the offer name contains every needle
/// (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    pub name_contains: Vec<String>,
    pub allowed_country: CountryCode,
}

impl ExclusionRule {
    #[must_use]
    pub fn new(needles: &[&str], allowed_country: CountryCode) -> Self {
        Self {
            name_contains: needles.iter().map(|n| n.to_lowercase()).collect(),
            allowed_country,
        }
    }

    #[must_use]
    pub fn matches(&self, offer: &Offer) -> bool {
        if self.name_contains.is_empty() {
            return false;
        }
        let name = offer.name.to_lowercase();
        self.name_contains
            .iter()
            .all(|needle| name.contains(&needle.to_lowercase()))
    }
}

/// The built-in rule set: the Perplexity offer bundled with Airtel is India-only.
#[must_use]
pub fn default_exclusion_rules() -> Vec<ExclusionRule> {
    vec![ExclusionRule {
        name_contains: vec!["perplexity".to_string(), "airtel".to_string()],
        allowed_country: CountryCode("IN".to_string()),
    }]
}

/// Whether `offer` may be shown to a visitor in `geo`.
///
/// Unresolved and resolving states are fail-open. Once resolved, the offer is
/// suppressed if any matching rule names a different country.
#[must_use]
pub fn is_visible_for(offer: &Offer, geo: &GeoState, rules: &[ExclusionRule]) -> bool {
    let Some(country) = geo.country() else {
        return true;
    };
    !rules
        .iter()
        .any(|rule| rule.matches(offer) && rule.allowed_country != *country)
}

/// Drops offers that are not visible for `geo`, keeping order.
#[must_use]
pub fn apply_region_exclusion(
    offers: Vec<Offer>,
    geo: &GeoState,
    rules: &[ExclusionRule],
) -> Vec<Offer> {
    offers
        .into_iter()
        .filter(|offer| is_visible_for(offer, geo, rules))
        .collect()
}

#[cfg(test)]
#[path = "regions_test.rs"]
mod tests;

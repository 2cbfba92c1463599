//! The normalized `Offer` shape consumed by catalog views, plus the regional
//! variant and discount-code types that hang off it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// A single promotional record, read-only within the catalog layer.
///
/// Field names match the backing store's column names so that persisted
/// snapshots (favorites) stay readable across releases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Short offer text, e.g. `"6 months free"`.
    #[serde(default)]
    pub offer: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub claim_url: String,
    #[serde(default)]
    pub logo: String,
    /// Free-text location, e.g. `"Global"` or `"India"`.
    #[serde(default)]
    pub location: String,
    /// Non-empty tags in their original column order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Part of the bundled developer-pack promotion.
    #[serde(default)]
    pub github_offer: bool,
    #[serde(default)]
    pub is_hidden_gem: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_underrated: bool,
    #[serde(default)]
    pub has_details_modal: bool,
    #[serde(default)]
    pub has_alt_links: bool,
    #[serde(default)]
    pub alt_links: Option<RegionalVariants>,
    #[serde(default)]
    pub has_discount_codes: bool,
    #[serde(default)]
    pub discount_codes: Option<Vec<DiscountCode>>,
    #[serde(default)]
    pub extra_info: Option<String>,
    #[serde(default)]
    pub urgency_badge: Option<String>,
    #[serde(default)]
    pub category_main: Option<String>,
    #[serde(default)]
    pub category_sub: Option<String>,
}

impl Offer {
    /// Returns `true` when the offer carries at least one discount code.
    #[must_use]
    pub fn has_codes(&self) -> bool {
        self.has_discount_codes && self.discount_codes.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Case-insensitive tag membership.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// A structured per-country variant: alternate claim URL and terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalDeal {
    pub url: String,
    pub offer_text: String,
    /// Emoji or icon reference for the country selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Regional variant map keyed by ISO country code, in source order.
///
/// The shape is decided once when the row enters the system: if the first
/// entry's value is an object with both `url` and `offer_text`, the whole map
/// is read as [`RegionalVariants::Structured`]; otherwise as
/// [`RegionalVariants::Legacy`] bare URLs. Entries that do not fit the chosen
/// shape are dropped with a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionalVariants {
    Legacy(Vec<(String, String)>),
    Structured(Vec<(String, RegionalDeal)>),
}

impl RegionalVariants {
    /// Builds the variant map from a raw JSON column value.
    ///
    /// Accepts an object, or a string holding a JSON-encoded object. Returns
    /// `None` for null and for any other JSON type.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::from_entries(
                map.iter().map(|(k, v)| (k.as_str(), v)),
            )),
            Value::String(text) if !text.trim().is_empty() => {
                match serde_json::from_str::<Value>(text) {
                    Ok(inner @ Value::Object(_)) => Self::from_value(&inner),
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!(error = %e, "alt_links string is not valid JSON");
                        None
                    }
                }
            }
            _ => None,
        }
    }

    fn from_entries<'a>(entries: impl Iterator<Item = (&'a str, &'a Value)>) -> Self {
        let mut entries = entries.peekable();
        let structured = entries
            .peek()
            .is_some_and(|(_, value)| is_structured_shape(value));

        if structured {
            let deals = entries
                .filter_map(|(code, value)| {
                    match serde_json::from_value::<RegionalDeal>(value.clone()) {
                        Ok(deal) => Some((code.to_string(), deal)),
                        Err(e) => {
                            tracing::warn!(
                                country_code = code,
                                error = %e,
                                "dropping regional entry that does not match structured shape"
                            );
                            None
                        }
                    }
                })
                .collect::<Vec<_>>();
            // An empty map has no shape; `{}` always reads back as legacy.
            if deals.is_empty() {
                Self::Legacy(Vec::new())
            } else {
                Self::Structured(deals)
            }
        } else {
            let urls = entries
                .filter_map(|(code, value)| {
                    if let Some(url) = value.as_str() {
                        Some((code.to_string(), url.to_string()))
                    } else {
                        tracing::warn!(
                            country_code = code,
                            "dropping regional entry that is not a bare URL"
                        );
                        None
                    }
                })
                .collect();
            Self::Legacy(urls)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Legacy(entries) => entries.len(),
            Self::Structured(entries) => entries.len(),
        }
    }

    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Country codes in source order.
    #[must_use]
    pub fn country_codes(&self) -> Vec<&str> {
        match self {
            Self::Legacy(entries) => entries.iter().map(|(code, _)| code.as_str()).collect(),
            Self::Structured(entries) => entries.iter().map(|(code, _)| code.as_str()).collect(),
        }
    }

    /// Structured deal for `code`; always `None` for legacy maps.
    #[must_use]
    pub fn structured(&self, code: &str) -> Option<&RegionalDeal> {
        match self {
            Self::Legacy(_) => None,
            Self::Structured(entries) => entries
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(code))
                .map(|(_, deal)| deal),
        }
    }

    /// Claim URL for `code` regardless of format.
    #[must_use]
    pub fn url(&self, code: &str) -> Option<&str> {
        match self {
            Self::Legacy(entries) => entries
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(code))
                .map(|(_, url)| url.as_str()),
            Self::Structured(_) => self.structured(code).map(|deal| deal.url.as_str()),
        }
    }
}

fn is_structured_shape(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("url") && obj.contains_key("offer_text"))
}

impl Serialize for RegionalVariants {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.len()))?;
        match self {
            Self::Legacy(entries) => {
                for (code, url) in entries {
                    map.serialize_entry(code, url)?;
                }
            }
            Self::Structured(entries) => {
                for (code, deal) in entries {
                    map.serialize_entry(code, deal)?;
                }
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RegionalVariants {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).ok_or_else(|| {
            serde::de::Error::custom("regional variants must be an object or JSON-encoded object")
        })
    }
}

/// A discount code attached to an offer.
///
/// The store holds either bare strings or `{code, description}` objects;
/// both deserialize into this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DiscountCodeRepr")]
pub struct DiscountCode {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DiscountCodeRepr {
    Bare(String),
    Full {
        code: String,
        #[serde(default)]
        description: Option<String>,
    },
}

impl From<DiscountCodeRepr> for DiscountCode {
    fn from(repr: DiscountCodeRepr) -> Self {
        match repr {
            DiscountCodeRepr::Bare(code) => Self {
                code,
                description: None,
            },
            DiscountCodeRepr::Full { code, description } => Self { code, description },
        }
    }
}

impl DiscountCode {
    /// Parses a raw `discount_codes` column value.
    ///
    /// Returns `None` for null or non-array values; array elements that are
    /// neither strings nor `{code}` objects are skipped.
    #[must_use]
    pub fn list_from_value(value: &Value) -> Option<Vec<Self>> {
        let items = match value {
            Value::Array(items) => items.clone(),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Array(items)) => items,
                _ => return None,
            },
            _ => return None,
        };

        Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<DiscountCode>(item).ok())
                .filter(|code| !code.code.trim().is_empty())
                .collect(),
        )
    }
}

//! Raw offer rows as returned by the backing store's read query.
//!
//! Every field except `id` is optional and loosely typed: the store has been
//! observed returning `0`/`1`/`null` for boolean columns and the catalog never
//! rejects a row for its contents.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Column projection for the offer read query, in wire order.
pub const OFFER_COLUMNS: &[&str] = &[
    "id",
    "name",
    "offer",
    "description",
    "claim_url",
    "logo",
    "location",
    "github_offer",
    "is_hidden_gem",
    "is_featured",
    "is_underrated",
    "has_details_modal",
    "has_alt_links",
    "alt_links",
    "has_discount_codes",
    "discount_codes",
    "extra_info",
    "urgency_badge",
    "tag1",
    "tag2",
    "tag3",
    "category_main",
    "category_sub",
];

/// Maximum rows a single catalog read returns.
pub const OFFER_ROW_LIMIT: u32 = 5000;

/// A boolean column value in whatever shape the store produced.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LooseBool {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Other(Value),
}

impl LooseBool {
    /// Strict boolean reading: non-zero numbers and `"true"`/`"t"`/`"1"`/`"yes"`
    /// are `true`; everything else is `false`.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Float(f) => f.abs() > f64::EPSILON,
            Self::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "t" | "1" | "yes"
            ),
            Self::Other(_) => false,
        }
    }
}

impl From<bool> for LooseBool {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One row of the offer read query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOfferRow {
    pub id: i64,
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub offer: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub claim_url: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub location: Option<String>,
    #[serde(default)]
    pub github_offer: Option<LooseBool>,
    #[serde(default)]
    pub is_hidden_gem: Option<LooseBool>,
    #[serde(default)]
    pub is_featured: Option<LooseBool>,
    #[serde(default)]
    pub is_underrated: Option<LooseBool>,
    #[serde(default)]
    pub has_details_modal: Option<LooseBool>,
    #[serde(default)]
    pub has_alt_links: Option<LooseBool>,
    #[serde(default)]
    pub alt_links: Option<Value>,
    #[serde(default)]
    pub has_discount_codes: Option<LooseBool>,
    #[serde(default)]
    pub discount_codes: Option<Value>,
    #[serde(default, deserialize_with = "loose_string")]
    pub extra_info: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub urgency_badge: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub tag1: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub tag2: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub tag3: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub category_main: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub category_sub: Option<String>,
}

/// Reads a text column that may arrive as a string, number, or bool.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

pub mod app_config;
pub mod categories;
pub mod config;
pub mod offers;
pub mod presentation;
pub mod rails;
pub mod regions;
pub mod rows;

pub use app_config::{AppConfig, Environment};
pub use categories::{
    category_icon, category_slug, count_fixed_categories, derive_categories,
    derive_subcategories, matches_category, offers_in_category, Category, FixedCategory,
    FIXED_CATEGORIES,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use offers::{DiscountCode, Offer, RegionalDeal, RegionalVariants};
pub use presentation::{
    load_presentations, normalize_offer_name, parse_presentations, resolve_presentation,
    PresentationConfig,
};
pub use rails::{developer_pack, featured, hidden_gems, search, underrated, Rail, SearchTerms};
pub use regions::{
    apply_region_exclusion, default_exclusion_rules, has_regional_offers, is_visible_for,
    list_available_countries, resolve_variant, variant_url, CountryCode, ExclusionRule, GeoState,
};
pub use rows::{LooseBool, RawOfferRow, OFFER_COLUMNS, OFFER_ROW_LIMIT};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid country code \"{0}\": expected two ASCII letters")]
    InvalidCountryCode(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read presentations file {path}: {source}")]
    PresentationsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse presentations file: {0}")]
    PresentationsFileParse(#[from] serde_yaml::Error),

    #[error("presentations validation error: {0}")]
    Validation(String),
}

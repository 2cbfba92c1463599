//! Read-only catalog commands: offers, categories, geolocation.

use std::sync::Arc;

use dealdeck_catalog::{ConfiguredSource, GeoContext, HttpGeoProbe, OfferFeed, PreloadSnapshot};
use dealdeck_core::{
    count_fixed_categories, default_exclusion_rules, derive_categories, derive_subcategories,
    matches_category, variant_url, AppConfig, Category, CountryCode, GeoState, Offer, Rail,
    SearchTerms, FIXED_CATEGORIES,
};
use tokio::sync::watch;

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct OfferFilters<'a> {
    pub country: Option<&'a str>,
    pub category: Option<&'a str>,
    pub rail: Option<&'a str>,
    pub search: Option<&'a str>,
}

/// Uses `--country` when given, otherwise runs one geolocation probe.
pub(crate) async fn resolve_geo(
    config: &AppConfig,
    country: Option<&str>,
) -> anyhow::Result<GeoState> {
    if let Some(raw) = country {
        return Ok(GeoState::Resolved(CountryCode::parse(raw)?));
    }

    let probe = HttpGeoProbe::new(
        &config.geo_probe_url,
        config.request_timeout_secs,
        &config.user_agent,
    )?;
    let ctx = GeoContext::new(probe, config.geo_fallback_country.clone());
    Ok(ctx.resolve().await)
}

/// Runs one fetch-controller pass for `geo` and returns the visible offers.
///
/// # Errors
///
/// Returns an error if no source is configured or the store read fails.
pub(crate) async fn load_visible_offers(
    config: &AppConfig,
    geo: GeoState,
) -> anyhow::Result<Vec<Offer>> {
    let source = Arc::new(ConfiguredSource::from_config(config).await?);
    let (_geo_tx, geo_rx) = watch::channel(geo);
    let feed = OfferFeed::new(
        source,
        PreloadSnapshot::new(),
        default_exclusion_rules(),
        geo_rx,
    );

    let state = feed.refresh().await;
    feed.shutdown();

    if let Some(error) = state.error {
        anyhow::bail!("failed to load offers: {error}");
    }
    tracing::debug!(count = state.offers.len(), "offers loaded");
    Ok(state.offers.as_ref().clone())
}

/// List offers visible for the resolved country, after optional filters.
///
/// # Errors
///
/// Returns an error for an unknown rail or country code, or if loading fails.
pub(crate) async fn run_offers(config: &AppConfig, filters: OfferFilters<'_>) -> anyhow::Result<()> {
    let rail = filters
        .rail
        .map(|raw| Rail::parse(raw).ok_or_else(|| anyhow::anyhow!("unknown rail '{raw}'")))
        .transpose()?;
    let terms = SearchTerms::parse(filters.search.unwrap_or_default());

    let geo = resolve_geo(config, filters.country).await?;
    let offers = load_visible_offers(config, geo.clone()).await?;

    let selected: Vec<&Offer> = offers
        .iter()
        .filter(|offer| rail.is_none_or(|r| r.includes(offer)))
        .filter(|offer| filters.category.is_none_or(|id| matches_category(offer, id)))
        .filter(|offer| terms.matches(offer))
        .collect();

    let country = geo.country().map(CountryCode::as_str);
    if selected.is_empty() {
        println!(
            "no offers found{}",
            country.map(|c| format!(" for {c}")).unwrap_or_default()
        );
        return Ok(());
    }

    println!("{:<7}{:<34}{:<22}{:<30}CLAIM", "ID", "NAME", "CATEGORY", "OFFER");
    for offer in &selected {
        let claim = country
            .and_then(|code| variant_url(offer, code))
            .unwrap_or(offer.claim_url.as_str());
        println!(
            "{:<7}{:<34}{:<22}{:<30}{}",
            offer.id,
            truncate(&offer.name, 32),
            truncate(offer.category_main.as_deref().unwrap_or("\u{2014}"), 20),
            truncate(&offer.offer, 28),
            claim
        );
    }
    println!();
    println!(
        "{} offer(s){}",
        selected.len(),
        country.map(|c| format!(" visible in {c}")).unwrap_or_default()
    );

    Ok(())
}

/// List derived categories, the fixed navigation counts, and optionally the
/// subcategories of one category.
///
/// # Errors
///
/// Returns an error for an invalid country code or if loading fails.
pub(crate) async fn run_categories(
    config: &AppConfig,
    country: Option<&str>,
    category: Option<&str>,
) -> anyhow::Result<()> {
    let geo = resolve_geo(config, country).await?;
    let offers = load_visible_offers(config, geo).await?;

    println!("Categories");
    print_categories(&derive_categories(&offers));
    println!();
    println!("Navigation");
    print_categories(&count_fixed_categories(&offers, FIXED_CATEGORIES));

    if let Some(id) = category {
        let subcategories = derive_subcategories(&offers, id);
        println!();
        if subcategories.is_empty() {
            println!("no subcategories for {id}");
        } else {
            println!("Subcategories of {id}: {}", subcategories.join(", "));
        }
    }

    Ok(())
}

/// Run one geolocation probe and print the outcome.
///
/// # Errors
///
/// Returns an error if the probe client cannot be built.
pub(crate) async fn run_geo(config: &AppConfig) -> anyhow::Result<()> {
    match resolve_geo(config, None).await? {
        GeoState::Resolved(code) if code == config.geo_fallback_country => {
            println!("country: {code} (matches fallback; the probe may have failed)");
        }
        GeoState::Resolved(code) => println!("country: {code}"),
        GeoState::Unresolved | GeoState::Resolving => println!("country: unresolved"),
    }
    Ok(())
}

fn print_categories(categories: &[Category]) {
    println!("{:<22}{:<26}{:<14}COUNT", "ID", "NAME", "ICON");
    for category in categories {
        println!(
            "{:<22}{:<26}{:<14}{}",
            category.id,
            truncate(&category.name, 24),
            category.icon,
            category.count
        );
    }
}

pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max - 3).collect::<String>())
    } else {
        text.to_string()
    }
}

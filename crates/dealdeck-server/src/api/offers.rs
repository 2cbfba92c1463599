use axum::{
    extract::{Query, State},
    Extension, Json,
};
use dealdeck_catalog::OfferSource;
use dealdeck_core::{
    apply_region_exclusion, count_fixed_categories, derive_categories, derive_subcategories,
    has_regional_offers, list_available_countries, matches_category, resolve_presentation,
    variant_url, Category, GeoState, Offer, Rail, SearchTerms, FIXED_CATEGORIES,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{geo_from_param, map_catalog_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct OfferItem {
    #[serde(flatten)]
    offer: Offer,
    has_regional_offers: bool,
    available_countries: Vec<String>,
    /// Claim URL of the visitor's regional variant, when the offer has one.
    regional_claim_url: Option<String>,
    /// Detail-view treatment, when a custom one is configured.
    presentation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OfferQuery {
    pub country: Option<String>,
    pub category: Option<String>,
    pub rail: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CategoryQuery {
    pub country: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CategoriesData {
    categories: Vec<Category>,
    fixed: Vec<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subcategories: Option<Vec<String>>,
}

fn validation_error(req_id: &RequestId, message: String) -> ApiError {
    ApiError::new(req_id.0.clone(), "validation_error", message)
}

async fn visible_offers<S: OfferSource>(
    state: &AppState<S>,
    req_id: &RequestId,
    country: Option<&str>,
) -> Result<(Vec<Offer>, GeoState), ApiError> {
    let geo = geo_from_param(country).map_err(|e| validation_error(req_id, e.to_string()))?;
    let catalog = state
        .catalog()
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;
    let visible = apply_region_exclusion(catalog.as_ref().clone(), &geo, &state.rules);
    Ok((visible, geo))
}

pub(super) async fn list_offers<S: OfferSource>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OfferQuery>,
) -> Result<Json<ApiResponse<Vec<OfferItem>>>, ApiError> {
    let rail = match query.rail.as_deref() {
        Some(raw) => Some(
            Rail::parse(raw)
                .ok_or_else(|| validation_error(&req_id, format!("unknown rail \"{raw}\"")))?,
        ),
        None => None,
    };
    let terms = SearchTerms::parse(query.q.as_deref().unwrap_or_default());

    let (visible, geo) = visible_offers(&state, &req_id, query.country.as_deref()).await?;
    let country = geo.country().map(|c| c.as_str().to_string());

    let data: Vec<OfferItem> = visible
        .into_iter()
        .filter(|offer| rail.is_none_or(|r| r.includes(offer)))
        .filter(|offer| {
            query
                .category
                .as_deref()
                .is_none_or(|id| matches_category(offer, id))
        })
        .filter(|offer| terms.matches(offer))
        .map(|offer| {
            let regional_claim_url = country
                .as_deref()
                .and_then(|code| variant_url(&offer, code))
                .map(ToOwned::to_owned);
            let presentation = resolve_presentation(&offer.name, &state.presentations)
                .map(|config| config.treatment.clone());
            OfferItem {
                has_regional_offers: has_regional_offers(&offer),
                available_countries: list_available_countries(&offer)
                    .into_iter()
                    .map(ToOwned::to_owned)
                    .collect(),
                regional_claim_url,
                presentation,
                offer,
            }
        })
        .collect();

    tracing::debug!(offer_count = data.len(), country = ?country, "listed offers");

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_categories<S: OfferSource>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<ApiResponse<CategoriesData>>, ApiError> {
    let (visible, _) = visible_offers(&state, &req_id, query.country.as_deref()).await?;

    let data = CategoriesData {
        categories: derive_categories(&visible),
        fixed: count_fixed_categories(&visible, FIXED_CATEGORIES),
        subcategories: query
            .category
            .as_deref()
            .map(|id| derive_subcategories(&visible, id)),
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

mod geo;
mod offers;
mod revalidate;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use dealdeck_catalog::{CatalogError, OfferSource, PreloadSnapshot};
use dealdeck_core::{
    CoreError, CountryCode, ExclusionRule, GeoState, Offer, PresentationConfig,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

/// Shared handler state. Cloning is cheap; the snapshot slot is shared.
#[derive(Debug)]
pub struct AppState<S> {
    pub source: Arc<S>,
    pub snapshot: PreloadSnapshot,
    pub rules: Arc<Vec<ExclusionRule>>,
    pub presentations: Arc<Vec<PresentationConfig>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            snapshot: self.snapshot.clone(),
            rules: Arc::clone(&self.rules),
            presentations: Arc::clone(&self.presentations),
        }
    }
}

impl<S: OfferSource> AppState<S> {
    pub fn new(
        source: Arc<S>,
        rules: Vec<ExclusionRule>,
        presentations: Vec<PresentationConfig>,
    ) -> Self {
        Self {
            source,
            snapshot: PreloadSnapshot::new(),
            rules: Arc::new(rules),
            presentations: Arc::new(presentations),
        }
    }

    /// The normalized catalog: the preload snapshot when warm, otherwise a
    /// fresh read that also warms it.
    pub(super) async fn catalog(&self) -> Result<Arc<Vec<Offer>>, CatalogError> {
        if let Some(snapshot) = self.snapshot.usable() {
            return Ok(snapshot.offers);
        }
        let snapshot = self.snapshot.prepare(self.source.as_ref()).await?;
        Ok(snapshot.offers)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    snapshot: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "store_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_catalog_error(request_id: String, error: &CatalogError) -> ApiError {
    tracing::error!(error = %error, "offer store read failed");
    ApiError::new(request_id, "store_unavailable", "offer store read failed")
}

/// Geolocation for a `?country=XX` parameter: resolved when present,
/// unresolved (fail-open) when absent.
pub(super) fn geo_from_param(country: Option<&str>) -> Result<GeoState, CoreError> {
    match country.map(str::trim).filter(|c| !c.is_empty()) {
        Some(raw) => Ok(GeoState::Resolved(CountryCode::parse(raw)?)),
        None => Ok(GeoState::Unresolved),
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router<S: OfferSource + 'static>(
    auth: AuthState,
    rate_limit: RateLimitState,
) -> Router<AppState<S>> {
    Router::new()
        .route("/api/revalidate", post(revalidate::revalidate::<S>))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app<S: OfferSource + 'static>(
    state: AppState<S>,
    auth: AuthState,
    rate_limit: RateLimitState,
) -> Router {
    let public_routes = Router::new()
        .route("/api/health", get(health::<S>))
        .route("/api/geo", get(geo::detect_country))
        .route("/api/offers", get(offers::list_offers::<S>))
        .route("/api/categories", get(offers::list_categories::<S>));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health<S: OfferSource>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let snapshot = if state.snapshot.usable().is_some() {
        "warm"
    } else {
        "cold"
    };

    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData {
                status: "ok",
                snapshot,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(30, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

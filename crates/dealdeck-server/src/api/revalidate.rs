use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use dealdeck_catalog::OfferSource;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_catalog_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct RevalidateRequest {
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct RevalidateData {
    revalidated: bool,
    paths: Vec<String>,
    offer_count: usize,
    now: DateTime<Utc>,
}

/// Drops the preload snapshot and rebuilds it from the store.
///
/// `paths` is echoed back for the caller's cache bookkeeping; the whole
/// snapshot is rebuilt regardless.
pub(super) async fn revalidate<S: OfferSource>(
    State(state): State<AppState<S>>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RevalidateRequest>,
) -> Result<Json<ApiResponse<RevalidateData>>, ApiError> {
    if body.paths.iter().any(|p| !p.starts_with('/')) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "every path must start with '/'",
        ));
    }

    let was_warm = state.snapshot.invalidate();
    let snapshot = state
        .snapshot
        .prepare(state.source.as_ref())
        .await
        .map_err(|e| map_catalog_error(req_id.0.clone(), &e))?;

    tracing::info!(
        paths = ?body.paths,
        was_warm,
        offer_count = snapshot.offers.len(),
        "preload snapshot revalidated"
    );

    Ok(Json(ApiResponse {
        data: RevalidateData {
            revalidated: true,
            paths: body.paths,
            offer_count: snapshot.offers.len(),
            now: snapshot.prepared_at,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

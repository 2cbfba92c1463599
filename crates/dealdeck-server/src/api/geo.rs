use axum::{http::HeaderMap, Json};
use dealdeck_core::CountryCode;
use serde::Serialize;

/// Edge headers carrying the visitor country, checked in order.
const COUNTRY_HEADERS: &[&str] = &["x-vercel-ip-country", "cf-ipcountry", "x-country-code"];

#[derive(Debug, Serialize)]
pub(super) struct GeoData {
    country_code: Option<CountryCode>,
}

/// Same-origin geolocation probe. `country_code` is null when no edge header
/// carries a usable code.
///
/// The body is bare `{ "country_code": .. }`, not the `{data, meta}`
/// envelope: `HttpGeoProbe` reads it directly.
pub(super) async fn detect_country(headers: HeaderMap) -> Json<GeoData> {
    let country_code = country_from_headers(&headers);
    if country_code.is_none() {
        tracing::debug!("no country header on geolocation probe");
    }

    Json(GeoData { country_code })
}

fn country_from_headers(headers: &HeaderMap) -> Option<CountryCode> {
    COUNTRY_HEADERS.iter().find_map(|name| {
        let raw = headers.get(*name)?.to_str().ok()?;
        // Cloudflare reports unknown and Tor traffic as XX and T1.
        CountryCode::parse(raw)
            .ok()
            .filter(|code| code.as_str() != "XX")
    })
}

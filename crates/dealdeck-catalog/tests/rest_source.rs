//! Integration tests for `RestOfferSource` against a local `wiremock` server.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dealdeck_catalog::{normalize_rows, CatalogError, OfferSource, RestOfferSource};

fn test_source(server: &MockServer, api_key: Option<&str>) -> RestOfferSource {
    RestOfferSource::new(&format!("{}/rest/v1", server.uri()), api_key, 5, "dealdeck-test/0.1")
        .expect("failed to build test RestOfferSource")
}

#[tokio::test]
async fn fetch_rows_requests_projection_order_and_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/offers"))
        .and(query_param("order", "id.asc"))
        .and(query_param("limit", "5000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = test_source(&server, None).fetch_rows(5000).await;
    assert!(rows.is_ok(), "expected Ok, got: {rows:?}");
    assert!(rows.unwrap().is_empty());
}

#[tokio::test]
async fn fetch_rows_sends_api_key_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/offers"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = test_source(&server, Some("anon-key"))
        .fetch_rows(10)
        .await
        .expect("rows");
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn loosely_typed_rows_normalize_and_bad_rows_are_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/offers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "name": "Cursor Pro",
                "tag1": "AI",
                "tag2": null,
                "tag3": "",
                "category_main": "AI Tools",
                "is_featured": 1,
                "is_hidden_gem": "false",
                "has_alt_links": true,
                "alt_links": "{\"US\": \"https://example.com/us\", \"IN\": \"https://example.com/in\"}"
            },
            {"name": "row without id"},
            {"id": "not-a-number"},
            {"id": 2, "name": 404}
        ])))
        .mount(&server)
        .await;

    let rows = test_source(&server, None)
        .fetch_rows(5000)
        .await
        .expect("rows");
    let offers = normalize_rows(rows);

    let ids: Vec<_> = offers.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![1, 2]);

    let first = &offers[0];
    assert_eq!(first.tags, vec!["AI"]);
    assert!(first.is_featured);
    assert!(!first.is_hidden_gem);
    assert_eq!(
        dealdeck_core::list_available_countries(first),
        vec!["US", "IN"]
    );
    assert_eq!(
        dealdeck_core::variant_url(first, "in"),
        Some("https://example.com/in")
    );
    assert!(dealdeck_core::resolve_variant(first, "IN").is_none());

    assert_eq!(offers[1].name, "404");
}

#[tokio::test]
async fn server_error_is_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/offers"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = test_source(&server, None)
        .fetch_rows(5000)
        .await
        .expect_err("500 must fail");
    assert!(
        matches!(err, CatalogError::UnexpectedStatus { status: 500, .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn non_array_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/offers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "nope"})))
        .mount(&server)
        .await;

    let err = test_source(&server, None)
        .fetch_rows(5000)
        .await
        .expect_err("object body must fail");
    assert!(
        matches!(err, CatalogError::Deserialize { .. }),
        "got: {err:?}"
    );
}

use serde_json::json;

use super::*;

fn row_from_json(value: serde_json::Value) -> RawOfferRow {
    serde_json::from_value(value).expect("valid raw row")
}

// -----------------------------------------------------------------------
// tags
// -----------------------------------------------------------------------

#[test]
fn tags_drop_null_and_empty_preserving_order() {
    let cases: [([Option<&str>; 3], Vec<&str>); 6] = [
        ([Some("AI"), None, Some("")], vec!["AI"]),
        ([None, Some("Dev"), Some("Free")], vec!["Dev", "Free"]),
        ([Some(""), Some(""), Some("")], vec![]),
        ([None, None, None], vec![]),
        ([Some("C"), Some("B"), Some("A")], vec!["C", "B", "A"]),
        ([Some(""), None, Some("Last")], vec!["Last"]),
    ];

    for (columns, expected) in cases {
        let row = RawOfferRow {
            id: 1,
            tag1: columns[0].map(ToOwned::to_owned),
            tag2: columns[1].map(ToOwned::to_owned),
            tag3: columns[2].map(ToOwned::to_owned),
            ..RawOfferRow::default()
        };
        assert_eq!(normalize_row(row).tags, expected, "columns: {columns:?}");
    }
}

#[test]
fn whitespace_tag_is_kept() {
    let row = RawOfferRow {
        id: 1,
        tag1: Some(" ".to_string()),
        ..RawOfferRow::default()
    };
    assert_eq!(normalize_row(row).tags, vec![" "]);
}

// -----------------------------------------------------------------------
// flags
// -----------------------------------------------------------------------

#[test]
fn flags_are_coerced_to_strict_booleans() {
    let offer = normalize_row(row_from_json(json!({
        "id": 1,
        "is_featured": 1,
        "is_hidden_gem": 0,
        "is_underrated": null,
        "github_offer": "true",
        "has_details_modal": true
    })));

    assert!(offer.is_featured);
    assert!(!offer.is_hidden_gem);
    assert!(!offer.is_underrated);
    assert!(offer.github_offer);
    assert!(offer.has_details_modal);
    assert!(!offer.has_alt_links);
}

// -----------------------------------------------------------------------
// end-to-end row
// -----------------------------------------------------------------------

#[test]
fn scenario_row_normalizes_and_categorizes() {
    let offer = normalize_row(row_from_json(json!({
        "id": 1,
        "tag1": "AI",
        "tag2": null,
        "tag3": "",
        "category_main": "AI Tools",
        "is_featured": 1
    })));

    assert_eq!(offer.tags, vec!["AI"]);
    assert!(offer.is_featured);

    let categories = dealdeck_core::derive_categories(std::slice::from_ref(&offer));
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].id, "ai-tools");
    assert_eq!(categories[0].name, "AI Tools");
    assert_eq!(categories[0].count, 1);
}

#[test]
fn malformed_fields_pass_through() {
    let offer = normalize_row(row_from_json(json!({
        "id": 9,
        "name": null,
        "claim_url": "not a url",
        "alt_links": [1, 2, 3],
        "discount_codes": {"code": "NOT-AN-ARRAY"},
        "has_alt_links": 1,
        "has_discount_codes": 1
    })));

    assert_eq!(offer.id, 9);
    assert_eq!(offer.name, "");
    assert_eq!(offer.claim_url, "not a url");
    assert!(offer.alt_links.is_none());
    assert!(offer.discount_codes.is_none());
    assert!(offer.has_alt_links);
    assert!(offer.has_discount_codes);
}

#[test]
fn regional_variants_and_codes_are_typed() {
    let offer = normalize_row(row_from_json(json!({
        "id": 3,
        "has_alt_links": true,
        "alt_links": {
            "US": {"url": "https://example.com/us", "offer_text": "3 months"},
            "IN": {"url": "https://example.com/in", "offer_text": "12 months"}
        },
        "has_discount_codes": true,
        "discount_codes": ["SAVE20", {"code": "EDU", "description": "students"}]
    })));

    let variants = offer.alt_links.as_ref().expect("variants");
    assert!(variants.is_structured());
    assert_eq!(variants.country_codes(), vec!["US", "IN"]);
    assert!(offer.has_codes());
    assert_eq!(offer.discount_codes.as_ref().map(Vec::len), Some(2));
}

#[test]
fn normalize_rows_preserves_order() {
    let rows = vec![
        RawOfferRow {
            id: 2,
            ..RawOfferRow::default()
        },
        RawOfferRow {
            id: 1,
            ..RawOfferRow::default()
        },
    ];
    let ids: Vec<_> = normalize_rows(rows).iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![2, 1]);
}

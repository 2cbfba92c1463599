use serde_json::json;

use super::*;
use crate::offers::RegionalVariants;

fn make_offer(id: i64, name: &str) -> Offer {
    Offer {
        id,
        name: name.to_string(),
        ..Offer::default()
    }
}

fn with_variants(mut offer: Offer, value: &serde_json::Value) -> Offer {
    offer.alt_links = RegionalVariants::from_value(value);
    offer.has_alt_links = offer.alt_links.as_ref().is_some_and(|v| !v.is_empty());
    offer
}

fn resolved(code: &str) -> GeoState {
    GeoState::Resolved(CountryCode::parse(code).unwrap())
}

// -----------------------------------------------------------------------
// CountryCode
// -----------------------------------------------------------------------

#[test]
fn country_code_parse_uppercases() {
    assert_eq!(CountryCode::parse(" us ").unwrap().as_str(), "US");
}

#[test]
fn country_code_rejects_bad_input() {
    assert!(CountryCode::parse("").is_err());
    assert!(CountryCode::parse("USA").is_err());
    assert!(CountryCode::parse("1N").is_err());
}

#[test]
fn country_code_deserialize_validates() {
    let ok: CountryCode = serde_json::from_value(json!("gb")).unwrap();
    assert_eq!(ok.as_str(), "GB");
    assert!(serde_json::from_value::<CountryCode>(json!("britain")).is_err());
}

// -----------------------------------------------------------------------
// variant access
// -----------------------------------------------------------------------

#[test]
fn has_regional_offers_requires_flag_and_entries() {
    let offer = with_variants(
        make_offer(1, "Spotify"),
        &json!({"US": "https://example.com/us"}),
    );
    assert!(has_regional_offers(&offer));

    let mut unflagged = offer.clone();
    unflagged.has_alt_links = false;
    assert!(!has_regional_offers(&unflagged));

    let mut flagged_empty = make_offer(2, "Empty");
    flagged_empty.has_alt_links = true;
    flagged_empty.alt_links = RegionalVariants::from_value(&json!({}));
    assert!(!has_regional_offers(&flagged_empty));
}

#[test]
fn resolve_variant_returns_structured_entry() {
    let offer = with_variants(
        make_offer(1, "Notion"),
        &json!({
            "US": {"url": "https://example.com/us", "offer_text": "Plus free"},
            "IN": {"url": "https://example.com/in", "offer_text": "6 months Plus", "requirements": "student email"}
        }),
    );
    let deal = resolve_variant(&offer, "IN").unwrap();
    assert_eq!(deal.offer_text, "6 months Plus");
    assert_eq!(deal.requirements.as_deref(), Some("student email"));
}

#[test]
fn resolve_variant_none_for_absent_code() {
    let offer = with_variants(
        make_offer(1, "Notion"),
        &json!({"US": {"url": "https://example.com/us", "offer_text": "free"}}),
    );
    assert!(resolve_variant(&offer, "FR").is_none());
}

#[test]
fn resolve_variant_none_for_legacy_map_regardless_of_code() {
    let offer = with_variants(
        make_offer(1, "Canva"),
        &json!({"US": "https://example.com/us", "IN": "https://example.com/in"}),
    );
    for code in ["US", "IN", "FR"] {
        assert!(resolve_variant(&offer, code).is_none());
    }
    assert_eq!(variant_url(&offer, "IN"), Some("https://example.com/in"));
}

#[test]
fn resolve_variant_none_without_variants() {
    assert!(resolve_variant(&make_offer(1, "Plain"), "US").is_none());
}

#[test]
fn list_available_countries_preserves_insertion_order() {
    let offer = with_variants(
        make_offer(1, "Figma"),
        &json!({"ZA": "https://a", "BR": "https://b", "AU": "https://c"}),
    );
    assert_eq!(list_available_countries(&offer), vec!["ZA", "BR", "AU"]);
    assert!(list_available_countries(&make_offer(2, "None")).is_empty());
}

// -----------------------------------------------------------------------
// region exclusion
// -----------------------------------------------------------------------

#[test]
fn airtel_perplexity_visible_only_in_india() {
    let offer = make_offer(1, "Perplexity Pro via Airtel");
    let rules = default_exclusion_rules();
    assert!(is_visible_for(&offer, &resolved("IN"), &rules));
    for code in ["US", "GB", "DE", "BR"] {
        assert!(!is_visible_for(&offer, &resolved(code), &rules));
    }
}

#[test]
fn exclusion_match_is_case_insensitive_and_requires_all_needles() {
    let rules = default_exclusion_rules();
    let lower = make_offer(1, "perplexity pro for AIRTEL users");
    assert!(!is_visible_for(&lower, &resolved("US"), &rules));

    let partial = make_offer(2, "Perplexity Pro");
    assert!(is_visible_for(&partial, &resolved("US"), &rules));
}

#[test]
fn unresolved_and_resolving_are_fail_open() {
    let offer = make_offer(1, "Perplexity Airtel");
    let rules = default_exclusion_rules();
    assert!(is_visible_for(&offer, &GeoState::Unresolved, &rules));
    assert!(is_visible_for(&offer, &GeoState::Resolving, &rules));
}

#[test]
fn any_matching_rule_with_other_country_suppresses() {
    let rules = vec![
        ExclusionRule::new(&["bundle"], CountryCode::parse("IN").unwrap()),
        ExclusionRule::new(&["bundle", "telco"], CountryCode::parse("US").unwrap()),
    ];
    let offer = make_offer(1, "Telco Bundle");
    assert!(!is_visible_for(&offer, &resolved("IN"), &rules));
    assert!(!is_visible_for(&offer, &resolved("US"), &rules));

    let only_first = make_offer(2, "Streaming Bundle");
    assert!(is_visible_for(&only_first, &resolved("IN"), &rules));
}

#[test]
fn empty_rule_never_matches() {
    let rule = ExclusionRule::new(&[], CountryCode::parse("IN").unwrap());
    assert!(!rule.matches(&make_offer(1, "Anything")));
}

#[test]
fn apply_region_exclusion_drops_rows_and_keeps_order() {
    let offers = vec![
        make_offer(1, "GitHub Copilot"),
        make_offer(2, "Perplexity Airtel"),
        make_offer(3, "JetBrains"),
    ];
    let visible = apply_region_exclusion(offers, &resolved("US"), &default_exclusion_rules());
    let ids: Vec<_> = visible.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![1, 3]);
}

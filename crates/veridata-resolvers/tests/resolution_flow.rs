//! End-to-end resolution tests: router dispatch, scope/aspect selection,
//! cache behavior, and failure envelopes over the static domains.
//!
//! Run with: `cargo test --test resolution_flow`

use std::sync::Arc;
use veridata_core::{
    FetchRouter, ResolverRegistry, TtlCache, VerifiableDataRequest, VerifiableDataResponse,
};
use veridata_resolvers::standard_registry;

// Unroutable: the live price path must not be exercised by these tests.
const OFFLINE_PRICE_API: &str = "http://127.0.0.1:1";

fn router() -> FetchRouter {
    router_with_cache(Arc::new(TtlCache::new()))
}

fn router_with_cache(cache: Arc<TtlCache>) -> FetchRouter {
    let registry: ResolverRegistry = standard_registry(cache, OFFLINE_PRICE_API);
    FetchRouter::new(Arc::new(registry))
}

fn request(data_type: &str, identifier: &str, details: Option<&str>) -> VerifiableDataRequest {
    VerifiableDataRequest {
        session_id: "test-session".to_string(),
        data_type: data_type.to_string(),
        identifier: identifier.to_string(),
        query_details: details.map(|d| d.to_string()),
    }
}

fn assert_success(envelope: &VerifiableDataResponse) {
    assert!(
        !envelope.is_error(),
        "unexpected error: {:?}",
        envelope.error_message
    );
    assert!(envelope
        .verification_summary
        .as_deref()
        .is_some_and(|s| !s.is_empty()));
}

#[tokio::test]
async fn seeded_identifiers_resolve_for_every_static_domain() {
    let router = router();
    let cases = [
        ("education_credential", "alex_chen"),
        ("supply_chain_status", "costa_rica_coffee"),
        ("carbon_footprint", "macbook_pro"),
        ("reputation_score", "trustdata_service"),
    ];
    for (data_type, identifier) in cases {
        let envelope = router.route(&request(data_type, identifier, None)).await;
        assert_success(&envelope);
        assert_eq!(envelope.request_data_type, data_type);
        assert_eq!(envelope.request_identifier, identifier);
    }
}

#[tokio::test]
async fn absent_identifier_yields_error_and_empty_payload() {
    let router = router();
    let envelope = router
        .route(&request("carbon_footprint", "warp_drive", None))
        .await;
    assert!(envelope.is_error());
    assert!(envelope
        .error_message
        .as_deref()
        .unwrap()
        .contains("in any scope (product, company, activity)"));
    let payload = envelope.data_payload.unwrap();
    assert!(payload.as_object().unwrap().is_empty());
}

#[tokio::test]
async fn carbon_product_lookup_returns_footprint_breakdown() {
    // Mixed-case identifier normalizes to the product record.
    let router = router();
    let envelope = router
        .route(&request("carbon_footprint", "MacBook_Pro", None))
        .await;
    assert_success(&envelope);
    let payload = envelope.data_payload.unwrap();
    assert_eq!(payload["carbonFootprint"]["total"], 185.3);
    assert_eq!(payload["carbonFootprint"]["breakdown"]["manufacturing"], 142.8);
    assert_eq!(payload["productInfo"]["name"], "EcoBook Pro 2023");
}

#[tokio::test]
async fn missing_requested_scope_falls_back_to_detected_scope() {
    // scope=company does not contain macbook_pro; auto-detection lands on product.
    let router = router();
    let envelope = router
        .route(&request(
            "carbon_footprint",
            "macbook_pro",
            Some("scope=company"),
        ))
        .await;
    assert_success(&envelope);
    let payload = envelope.data_payload.unwrap();
    assert!(payload.get("productInfo").is_some());
    assert_eq!(payload["carbonFootprint"]["total"], 185.3);
}

#[tokio::test]
async fn requested_scope_wins_when_identifier_exists_there() {
    let router = router();
    let envelope = router
        .route(&request(
            "carbon_footprint",
            "greencorp",
            Some("scope=company"),
        ))
        .await;
    assert_success(&envelope);
    let payload = envelope.data_payload.unwrap();
    assert!(payload.get("companyInfo").is_some());
    assert_eq!(payload["emissions"]["total"], 12500.0);
}

#[tokio::test]
async fn reputation_alias_resolves_to_general_view() {
    // "Alex Rodriguez" -> alex_developer; no requested aspect; substring
    // heuristics cannot match a lowercased identifier, so general wins.
    let router = router();
    let envelope = router
        .route(&request("reputation_score", "Alex Rodriguez", None))
        .await;
    assert_success(&envelope);
    let payload = envelope.data_payload.unwrap();
    assert_eq!(payload["reputationScores"]["overall"], 92);
    assert_eq!(payload["entityInfo"]["name"], "Alex Rodriguez");
}

#[tokio::test]
async fn requested_reputation_aspect_selects_specialized_view() {
    let router = router();
    let envelope = router
        .route(&request(
            "reputation_score",
            "alex_developer",
            Some("aspect=developer"),
        ))
        .await;
    assert_success(&envelope);
    let payload = envelope.data_payload.unwrap();
    assert_eq!(payload["reputationScores"]["overall"], 95);
    assert_eq!(payload["statistics"]["repositories"], 32);
}

#[tokio::test]
async fn unknown_reputation_entity_fails_before_aspect_logic() {
    let router = router();
    let envelope = router
        .route(&request(
            "reputation_score",
            "nobody_here",
            Some("aspect=developer"),
        ))
        .await;
    assert!(envelope.is_error());
    assert!(envelope
        .error_message
        .unwrap()
        .contains("No reputation information found for identifier 'nobody_here'"));
}

#[tokio::test]
async fn unsupported_data_type_lists_the_known_set() {
    let router = router();
    let envelope = router.route(&request("stock_price", "aapl", None)).await;
    assert!(envelope.is_error());
    let error = envelope.error_message.unwrap();
    for name in [
        "crypto_price",
        "education_credential",
        "supply_chain_status",
        "carbon_footprint",
        "reputation_score",
    ] {
        assert!(error.contains(name), "missing {name} in: {error}");
    }
    let payload = envelope.data_payload.unwrap();
    assert!(payload.as_object().unwrap().is_empty());
}

#[tokio::test]
async fn data_type_dispatch_is_case_insensitive() {
    let router = router();
    let envelope = router
        .route(&request("Carbon_Footprint", "macbook_pro", None))
        .await;
    assert_success(&envelope);
}

#[tokio::test]
async fn repeat_resolution_within_ttl_reuses_the_snapshot() {
    let cache = Arc::new(TtlCache::new());
    let router = router_with_cache(Arc::clone(&cache));
    let req = request("education_credential", "Jane Doe", None);

    let first = router.route(&req).await;
    let cached_entries = cache.len();
    let second = router.route(&req).await;

    assert_success(&first);
    assert_eq!(cache.len(), cached_entries, "no new entries on a fresh hit");
    // Identical record content yields identical proof hashes.
    assert_eq!(
        first.data_payload.unwrap()["verificationProof"],
        second.data_payload.unwrap()["verificationProof"]
    );
}

#[tokio::test]
async fn education_profile_carries_derived_did() {
    let router = router();
    let envelope = router
        .route(&request("education_credential", "Alex Chen", None))
        .await;
    assert_success(&envelope);
    let payload = envelope.data_payload.unwrap();
    assert!(payload["profile"]["identifierDid"]
        .as_str()
        .unwrap()
        .starts_with("did:veri:"));
    assert_eq!(payload["credentials"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn supply_chain_payload_includes_journey_and_proof() {
    let router = router();
    let envelope = router
        .route(&request("supply_chain_status", "ecophone_x1", None))
        .await;
    assert_success(&envelope);
    let payload = envelope.data_payload.unwrap();
    assert_eq!(payload["supplyChain"].as_array().unwrap().len(), 4);
    assert_eq!(payload["product"]["manufacturer"], "GreenTech Electronics");
    assert_eq!(
        payload["verificationProof"]["hash"].as_str().unwrap().len(),
        64
    );
}

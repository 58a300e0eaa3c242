//! Token reads through the key-value session

use crate::integration::test_utils::{make_token, write_entries, write_token, Harness, HOST_APP, UNKNOWN_APP};
use serde_json::json;
use shared_store::error::AccessError;

#[test]
fn test_unavailable_container_opens_nothing() {
    let harness = Harness::new();
    write_token(&harness.container, &make_token(r#"{"sub":"u1"}"#));

    assert!(harness.store.token(UNKNOWN_APP).is_none());
    assert!(harness.store.claims(UNKNOWN_APP).is_none());
    assert!(matches!(
        harness.store.tokens().try_get_token(UNKNOWN_APP),
        Err(AccessError::UnavailableContainer(_))
    ));

    assert_eq!(harness.kv.inits(), 0);
    assert_eq!(harness.kv.opens(), 0);
    assert_eq!(harness.registry.initialized_count(), 0);
}

#[test]
fn test_token_read_and_claims_round_trip() {
    let harness = Harness::new();
    let payload = r#"{"sub":"user-1","name":"Ada","exp":4102444800}"#;
    let token = make_token(payload);
    write_token(&harness.container, &token);

    assert_eq!(harness.store.token(HOST_APP), Some(token));

    let claims = harness.store.claims(HOST_APP).unwrap();
    assert_eq!(claims.subject(), Some("user-1"));
    assert_eq!(claims.get("name"), Some(&json!("Ada")));
    assert!(claims.expires_at().is_some());

    let map = harness.store.tokens().decode_claims(HOST_APP).unwrap();
    assert_eq!(
        serde_json::Value::Object(map),
        serde_json::from_str::<serde_json::Value>(payload).unwrap()
    );
}

#[test]
fn test_two_segment_token_has_no_claims() {
    let harness = Harness::new();
    write_token(&harness.container, "header.payload");

    assert_eq!(harness.store.token(HOST_APP).as_deref(), Some("header.payload"));
    assert!(harness.store.claims(HOST_APP).is_none());
}

#[test]
fn test_missing_store_means_no_token() {
    let harness = Harness::new();

    assert!(harness.store.token(HOST_APP).is_none());
    assert!(matches!(
        harness.store.tokens().try_get_token(HOST_APP),
        Err(AccessError::EngineOpen(_))
    ));
    assert_eq!(harness.kv.opens(), 0);
}

#[test]
fn test_missing_key_reports_missing_token() {
    let harness = Harness::new();
    write_entries(&harness.container, &[("Other", "value")]);

    assert!(matches!(
        harness.store.tokens().try_get_token(HOST_APP),
        Err(AccessError::MissingToken(_))
    ));
    assert_eq!(harness.kv.opens(), harness.kv.closes());
}

#[test]
fn test_engine_initialized_once_per_directory() {
    let harness = Harness::new();
    write_token(&harness.container, &make_token(r#"{"sub":"u1"}"#));

    for _ in 0..5 {
        assert!(harness.store.token(HOST_APP).is_some());
    }

    assert_eq!(harness.kv.inits(), 1);
    assert!(harness.registry.is_initialized(&harness.container));
    assert_eq!(harness.registry.initialized_count(), 1);
}

#[test]
fn test_every_handle_is_cleared_and_closed() {
    let harness = Harness::new();
    write_token(&harness.container, &make_token(r#"{"sub":"u1"}"#));

    for _ in 0..3 {
        harness.store.token(HOST_APP);
        harness.store.claims(HOST_APP);
    }

    assert_eq!(harness.kv.opens(), 6);
    assert_eq!(harness.kv.closes(), 6);
    assert_eq!(
        harness
            .kv
            .cache_clears
            .load(std::sync::atomic::Ordering::SeqCst),
        6
    );
}

#[test]
fn test_token_readable_after_store_rewritten() {
    let harness = Harness::new();
    write_token(&harness.container, "first.token.value");
    assert_eq!(harness.store.token(HOST_APP).as_deref(), Some("first.token.value"));

    write_token(&harness.container, "second.token.value");
    assert_eq!(harness.store.token(HOST_APP).as_deref(), Some("second.token.value"));
}

//! Signed image URLs

use crate::integration::test_utils::{write_token, Harness, HOST_APP, UNKNOWN_APP};
use shared_store::host::HostConfig;
use shared_store::media::ImageSubject;

#[test]
fn test_group_and_user_urls() {
    let harness = Harness::new();
    write_token(&harness.container, "t0k");

    assert_eq!(
        harness.store.image_url(true, "g1", "u1", HOST_APP).as_deref(),
        Some("https://api.example.com/groups/g1/picture?token=t0k")
    );
    assert_eq!(
        harness.store.image_url(false, "g1", "u1", HOST_APP).as_deref(),
        Some("https://api.example.com/users/u1/profile-picture?token=t0k")
    );
    assert_eq!(
        harness
            .store
            .media()
            .image_url(&ImageSubject::User("u2".to_string()), HOST_APP)
            .as_deref(),
        Some("https://api.example.com/users/u2/profile-picture?token=t0k")
    );
}

#[test]
fn test_no_url_without_token() {
    let harness = Harness::new();

    assert!(harness.store.image_url(true, "g1", "u1", HOST_APP).is_none());
    assert!(harness.store.image_url(true, "g1", "u1", UNKNOWN_APP).is_none());
}

#[test]
fn test_no_url_without_base_address() {
    let harness = Harness::with_host(HostConfig::default());
    write_token(&harness.container, "t0k");

    assert!(harness.store.image_url(false, "g1", "u1", HOST_APP).is_none());
    assert_eq!(harness.kv.opens(), 0);
}

#[test]
fn test_per_app_override() {
    let mut host = HostConfig::with_base_url("https://api.example.com/");
    host.overrides
        .insert(HOST_APP.to_string(), "https://media.example.com/v2/".to_string());
    let harness = Harness::with_host(host);
    write_token(&harness.container, "t0k");

    assert_eq!(
        harness.store.image_url(true, "g9", "_", HOST_APP).as_deref(),
        Some("https://media.example.com/v2/groups/g9/picture?token=t0k")
    );
}

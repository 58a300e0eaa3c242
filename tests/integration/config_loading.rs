//! Loading configuration and opening a store from it

use crate::integration::test_utils::{make_token, with_xdg_env, write_token, HOST_APP};
use shared_store::config::ConfigLoader;
use shared_store::session::CleanupPolicy;
use shared_store::{AccessError, SessionProfile, SharedStore, SharedStoreConfig};
use tempfile::TempDir;

#[test]
fn test_open_from_local_config_file() {
    let test_dir = TempDir::new().unwrap();
    let root = test_dir.path().join("containers");
    let container = root.join(format!("shared.{}", HOST_APP));
    std::fs::create_dir_all(&container).unwrap();
    let token = make_token(r#"{"sub":"user-42"}"#);
    write_token(&container, &token);

    let host_dir = test_dir.path().join("host");
    std::fs::create_dir_all(&host_dir).unwrap();
    std::fs::write(
        host_dir.join("shared-store.toml"),
        format!(
            r#"
[host]
api_base_url = "https://api.example.com/"

[container]
root = "{}"
group_prefix = "shared"

[profile]
log_category = "notification-extension"
schema_version = 206
cleanup_policy = "close_only"
"#,
            root.display()
        ),
    )
    .unwrap();

    let config = with_xdg_env(&test_dir, || ConfigLoader::load(&host_dir)).unwrap();
    assert_eq!(config.profile.cleanup_policy, CleanupPolicy::CloseOnly);
    assert_eq!(config.container.group_prefix, "shared");

    let store = SharedStore::open(config).unwrap();
    assert_eq!(store.token(HOST_APP), Some(token));
    assert_eq!(
        store.claims(HOST_APP).unwrap().subject(),
        Some("user-42")
    );
    assert_eq!(store.config().profile.log_category, "notification-extension");
}

#[test]
fn test_global_file_supplies_schema_version() {
    let test_dir = TempDir::new().unwrap();
    let host_dir = test_dir.path().join("host");
    std::fs::create_dir_all(&host_dir).unwrap();

    let config = with_xdg_env(&test_dir, || {
        let global = ConfigLoader::global_config_path().unwrap();
        std::fs::create_dir_all(global.parent().unwrap()).unwrap();
        std::fs::write(&global, "[profile]\nschema_version = 205\n").unwrap();
        ConfigLoader::load(&host_dir)
    })
    .unwrap();

    assert_eq!(config.profile.schema_version, 205);
    assert_eq!(config.key_value.token_key, "Token");
    assert_eq!(config.http.timeout_secs, 10);
}

#[test]
fn test_load_without_schema_version_fails() {
    let test_dir = TempDir::new().unwrap();
    let host_dir = test_dir.path().join("host");
    std::fs::create_dir_all(&host_dir).unwrap();

    let result = with_xdg_env(&test_dir, || ConfigLoader::load(&host_dir));
    assert!(matches!(result, Err(AccessError::ConfigError(_))));
}

#[test]
fn test_open_rejects_invalid_config() {
    let mut config = SharedStoreConfig::new(SessionProfile::new("app", 206));
    config.host.api_base_url = Some("ftp://files.example.com/".to_string());

    match SharedStore::open(config) {
        Err(AccessError::ConfigError(msg)) => assert!(msg.contains("http or https")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("invalid configuration accepted"),
    }

    let config = SharedStoreConfig::new(SessionProfile::new("app", 0));
    assert!(SharedStore::open(config).is_err());
}

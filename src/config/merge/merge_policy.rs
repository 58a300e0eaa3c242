//! Merge rules: defaults, override order, conflict handling.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// `profile.schema_version` has no default; some layer has to provide it.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("container.group_prefix", "group")?
        .set_default("key_value.map_id", "default")?
        .set_default("key_value.directory", "kv")?
        .set_default("key_value.token_key", "Token")?
        .set_default("object_store.file_name", "default.store")?
        .set_default("profile.log_category", "shared-store")?
        .set_default("http.timeout_secs", 10)
}

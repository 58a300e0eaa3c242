//! Host-supplied config file source: <config_dir>/shared-store.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;

pub const LOCAL_CONFIG_FILE: &str = "shared-store.toml";

/// Add the host's config file to builder.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    config_dir: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = config_dir.join(LOCAL_CONFIG_FILE);
    if !path.exists() {
        return Ok(builder);
    }
    Ok(builder.add_source(File::from(path).required(false)))
}

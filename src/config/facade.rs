//! Configuration loading entry points.

use super::merge::merge_policy;
use super::sources::{environment, global_file, local_file};
use super::SharedStoreConfig;
use crate::error::AccessError;
use config::File;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a host whose config files live in `config_dir`.
    ///
    /// Precedence, lowest first: defaults, global file, `<config_dir>/shared-store.toml`,
    /// environment.
    pub fn load(config_dir: &Path) -> Result<SharedStoreConfig, AccessError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = local_file::add_to_builder(builder, config_dir)?;
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?.try_deserialize::<SharedStoreConfig>()?;
        tracing::debug!(
            config_dir = %config_dir.display(),
            category = %config.profile.log_category,
            schema_version = config.profile.schema_version,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load configuration from a single file on top of the defaults.
    pub fn load_from_file(path: &Path) -> Result<SharedStoreConfig, AccessError> {
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path))
            .build()?;
        Ok(config.try_deserialize::<SharedStoreConfig>()?)
    }

    /// Parse a TOML document, e.g. one embedded in a host bundle.
    pub fn from_toml_str(contents: &str) -> Result<SharedStoreConfig, AccessError> {
        toml::from_str(contents)
            .map_err(|e| AccessError::ConfigError(format!("Invalid TOML configuration: {}", e)))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}

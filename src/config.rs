//! Configuration System
//!
//! Layered configuration for the access layer: built-in defaults, a user-level file, a
//! host-supplied file, then `SHARED_STORE__<SECTION>__<KEY>` environment variables.

use crate::error::AccessError;
use crate::host::{validate_base_url, HostConfig};
use crate::kv::sqlite_engine::DEFAULT_KV_DIR;
use crate::kv::{EngineLogLevel, DEFAULT_MAP_ID};
use crate::logging::LoggingConfig;
use crate::objects::session::DEFAULT_STORE_FILE;
use crate::session::SessionProfile;
use crate::token::TOKEN_KEY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedStoreConfig {
    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub container: ContainerConfig,

    #[serde(default)]
    pub key_value: KeyValueConfig,

    #[serde(default)]
    pub object_store: ObjectStoreConfig,

    /// Session profile; `schema_version` has no default and must be configured
    pub profile: SessionProfile,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where shared containers live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Directory holding one sub-directory per application group
    #[serde(default)]
    pub root: Option<PathBuf>,

    #[serde(default = "default_group_prefix")]
    pub group_prefix: String,
}

fn default_group_prefix() -> String {
    "group".to_string()
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            root: None,
            group_prefix: default_group_prefix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueConfig {
    #[serde(default = "default_map_id")]
    pub map_id: String,

    /// Sub-directory of the container holding key-value stores
    #[serde(default = "default_kv_dir")]
    pub directory: String,

    #[serde(default)]
    pub log_level: EngineLogLevel,

    #[serde(default = "default_token_key")]
    pub token_key: String,
}

fn default_map_id() -> String {
    DEFAULT_MAP_ID.to_string()
}

fn default_kv_dir() -> String {
    DEFAULT_KV_DIR.to_string()
}

fn default_token_key() -> String {
    TOKEN_KEY.to_string()
}

impl Default for KeyValueConfig {
    fn default() -> Self {
        Self {
            map_id: default_map_id(),
            directory: default_kv_dir(),
            log_level: EngineLogLevel::default(),
            token_key: default_token_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    #[serde(default = "default_store_file")]
    pub file_name: String,
}

fn default_store_file() -> String {
    DEFAULT_STORE_FILE.to_string()
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            file_name: default_store_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Host(String),
    KeyValue(String),
    ObjectStore(String),
    Profile(String),
    Http(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Host(msg) => write!(f, "Host: {}", msg),
            ValidationError::KeyValue(msg) => write!(f, "Key-value: {}", msg),
            ValidationError::ObjectStore(msg) => write!(f, "Object store: {}", msg),
            ValidationError::Profile(msg) => write!(f, "Profile: {}", msg),
            ValidationError::Http(msg) => write!(f, "HTTP: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SharedStoreConfig {
    pub fn new(profile: SessionProfile) -> Self {
        Self {
            host: HostConfig::default(),
            container: ContainerConfig::default(),
            key_value: KeyValueConfig::default(),
            object_store: ObjectStoreConfig::default(),
            profile,
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for url in self.host.configured_urls() {
            if let Err(e) = validate_base_url(url) {
                errors.push(ValidationError::Host(e));
            }
        }

        if self.key_value.map_id.trim().is_empty() {
            errors.push(ValidationError::KeyValue("Map id cannot be empty".to_string()));
        }
        if self.key_value.token_key.trim().is_empty() {
            errors.push(ValidationError::KeyValue("Token key cannot be empty".to_string()));
        }
        if self.object_store.file_name.trim().is_empty() {
            errors.push(ValidationError::ObjectStore(
                "Store file name cannot be empty".to_string(),
            ));
        }
        if let Err(e) = self.profile.validate() {
            errors.push(ValidationError::Profile(e));
        }
        if self.http.timeout_secs == 0 {
            errors.push(ValidationError::Http("Timeout must be at least one second".to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one configuration error.
    pub fn validated(self) -> Result<Self, AccessError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            AccessError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }
}

//! Host configuration surface.
//!
//! The only host metadata this layer reads is the API base address. A host without one
//! configured simply has no remote features.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source of host application metadata
pub trait HostMetadata: Send + Sync {
    fn api_base_url(&self, host_app_id: &str) -> Option<String>;
}

/// API base addresses from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Base address used by every host app without an override
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Per host app overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

impl HostConfig {
    pub fn with_base_url(url: impl Into<String>) -> Self {
        Self {
            api_base_url: Some(url.into()),
            overrides: HashMap::new(),
        }
    }

    /// Every configured base address, for validation
    pub fn configured_urls(&self) -> impl Iterator<Item = &str> {
        self.api_base_url
            .iter()
            .map(String::as_str)
            .chain(self.overrides.values().map(String::as_str))
    }
}

impl HostMetadata for HostConfig {
    fn api_base_url(&self, host_app_id: &str) -> Option<String> {
        self.overrides
            .get(host_app_id)
            .or(self.api_base_url.as_ref())
            .filter(|url| !url.trim().is_empty())
            .cloned()
    }
}

/// Validate a base address: absolute http(s) URL ending with `/`.
pub fn validate_base_url(url: &str) -> Result<(), String> {
    let parsed = reqwest::Url::parse(url).map_err(|e| format!("Invalid base URL {}: {}", url, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(format!("Base URL {} must use http or https", url));
    }
    if !url.ends_with('/') {
        return Err(format!("Base URL {} must end with '/'", url));
    }
    Ok(())
}

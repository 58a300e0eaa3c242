//! Session profile shared by the key-value and object-store sessions.
//!
//! One profile replaces the per-context copies of the access code: the main app and each
//! extension run the same sessions with their own log category, schema version and
//! cleanup policy.

use serde::{Deserialize, Serialize};

/// What a session does when it releases a key-value handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Drop the engine's in-memory cache for the handle, then close it.
    #[default]
    ClearCacheAndClose,
    /// Close the handle and leave the engine's cache alone.
    CloseOnly,
}

impl CleanupPolicy {
    pub fn clears_cache(self) -> bool {
        matches!(self, CleanupPolicy::ClearCacheAndClose)
    }
}

/// Per-context session parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProfile {
    /// Attached as the `category` field of every store span
    #[serde(default = "default_log_category")]
    pub log_category: String,

    /// Object-store schema version the writer uses. Required, there is no default.
    pub schema_version: u64,

    #[serde(default)]
    pub cleanup_policy: CleanupPolicy,
}

fn default_log_category() -> String {
    "shared-store".to_string()
}

impl SessionProfile {
    pub fn new(log_category: impl Into<String>, schema_version: u64) -> Self {
        Self {
            log_category: log_category.into(),
            schema_version,
            cleanup_policy: CleanupPolicy::default(),
        }
    }

    pub fn with_cleanup_policy(mut self, cleanup_policy: CleanupPolicy) -> Self {
        self.cleanup_policy = cleanup_policy;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version == 0 {
            return Err("Schema version must be greater than zero".to_string());
        }
        if self.log_category.trim().is_empty() {
            return Err("Log category cannot be empty".to_string());
        }
        Ok(())
    }
}

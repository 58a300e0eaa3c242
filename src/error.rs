//! Error types for the shared-store access layer.
//!
//! Every public component operation is fail-soft: it logs one of these errors and
//! degrades to an absence value. The `try_*` variants hand the error back instead.

use std::path::PathBuf;
use thiserror::Error;

/// Key-value and object-store engine errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Engine initialization failed for {directory:?}: {reason}")]
    EngineInit { directory: PathBuf, reason: String },

    #[error("Failed to open store at {path:?}: {reason}")]
    EngineOpen { path: PathBuf, reason: String },

    #[error("Store not found: {0:?}")]
    MissingStore(PathBuf),

    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: u64, found: u64 },

    #[error("Corrupt store data: {0}")]
    Corrupt(String),

    #[error("Snapshot used after invalidation")]
    Invalidated,

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Claims token decoding errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Expected 3 token segments, found {0}")]
    SegmentCount(usize),

    #[error("Claims segment is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Claims segment is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Claims payload is not a JSON object")]
    NotAnObject,
}

/// HTTP transport errors
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),
}

/// Access-layer errors
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Shared container unavailable for host app: {0}")]
    UnavailableContainer(String),

    #[error("Engine open failure: {0}")]
    EngineOpen(#[from] StorageError),

    #[error("Malformed token: {0}")]
    MalformedToken(#[from] TokenError),

    #[error("No token stored for host app: {0}")]
    MissingToken(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for AccessError {
    fn from(err: config::ConfigError) -> Self {
        AccessError::ConfigError(err.to_string())
    }
}

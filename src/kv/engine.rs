//! Key-value engine capability

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine log verbosity passed at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngineLogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    None,
}

/// Handle sharing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    SingleProcess,
    MultiProcess,
}

/// Multi-process key-value engine
///
/// `initialize` must run at most once per group directory per process; callers go
/// through [`EngineInitRegistry`](super::EngineInitRegistry) to guarantee that.
pub trait KeyValueEngine: Send + Sync {
    fn initialize(&self, group_dir: &Path, log_level: EngineLogLevel) -> Result<(), StorageError>;

    fn open(
        &self,
        group_dir: &Path,
        map_id: &str,
        mode: AccessMode,
    ) -> Result<Box<dyn KeyValueHandle>, StorageError>;
}

/// Open handle onto one named store
pub trait KeyValueHandle: Send {
    fn read_string(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Drop the engine's in-memory cache for this handle.
    fn clear_memory_cache(&mut self);

    /// Release the handle. Reads after `close` are an engine error.
    fn close(&mut self);
}

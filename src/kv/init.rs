//! Per-directory engine initialization record.

use super::engine::{EngineLogLevel, KeyValueEngine};
use crate::error::StorageError;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

static GLOBAL_REGISTRY: OnceLock<Arc<EngineInitRegistry>> = OnceLock::new();

/// Result of [`EngineInitRegistry::ensure_initialized`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Initialized,
    AlreadyInitialized,
}

/// Set of group directories whose engine has been initialized in this process.
///
/// Lives for the process lifetime. The check-then-insert sequence runs under one lock so
/// initialization for a directory happens-before any handle is opened against it.
#[derive(Debug, Default)]
pub struct EngineInitRegistry {
    initialized: Mutex<BTreeSet<PathBuf>>,
}

impl EngineInitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by [`SharedStore::open`](crate::api::SharedStore::open).
    pub fn global() -> Arc<Self> {
        GLOBAL_REGISTRY
            .get_or_init(|| Arc::new(Self::new()))
            .clone()
    }

    /// Initialize `engine` for `directory` unless this registry has already done so.
    ///
    /// A failed initialization is not recorded, so the next caller retries it.
    pub fn ensure_initialized(
        &self,
        engine: &dyn KeyValueEngine,
        directory: &Path,
        log_level: EngineLogLevel,
    ) -> Result<InitOutcome, StorageError> {
        let mut initialized = self.initialized.lock();
        if initialized.contains(directory) {
            return Ok(InitOutcome::AlreadyInitialized);
        }

        engine.initialize(directory, log_level)?;
        initialized.insert(directory.to_path_buf());
        tracing::debug!(directory = %directory.display(), "Key-value engine initialized");
        Ok(InitOutcome::Initialized)
    }

    pub fn is_initialized(&self, directory: &Path) -> bool {
        self.initialized.lock().contains(directory)
    }

    pub fn initialized_count(&self) -> usize {
        self.initialized.lock().len()
    }

    /// Forget every recorded directory. Meant for tests that share a registry.
    pub fn reset(&self) {
        self.initialized.lock().clear();
    }
}

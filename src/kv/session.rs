//! Scoped key-value handles.

use super::engine::{AccessMode, EngineLogLevel, KeyValueEngine, KeyValueHandle};
use super::init::{EngineInitRegistry, InitOutcome};
use crate::error::StorageError;
use crate::session::{CleanupPolicy, SessionProfile};
use std::path::Path;
use std::sync::Arc;

/// Name of the store every process of the application family shares
pub const DEFAULT_MAP_ID: &str = "default";

/// Opens one short-lived handle per logical operation.
pub struct KeyValueSession {
    engine: Arc<dyn KeyValueEngine>,
    registry: Arc<EngineInitRegistry>,
    profile: SessionProfile,
    map_id: String,
    log_level: EngineLogLevel,
}

impl KeyValueSession {
    pub fn new(
        engine: Arc<dyn KeyValueEngine>,
        registry: Arc<EngineInitRegistry>,
        profile: SessionProfile,
    ) -> Self {
        Self {
            engine,
            registry,
            profile,
            map_id: DEFAULT_MAP_ID.to_string(),
            log_level: EngineLogLevel::default(),
        }
    }

    pub fn with_map_id(mut self, map_id: impl Into<String>) -> Self {
        self.map_id = map_id.into();
        self
    }

    pub fn with_log_level(mut self, log_level: EngineLogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn profile(&self) -> &SessionProfile {
        &self.profile
    }

    pub fn registry(&self) -> &Arc<EngineInitRegistry> {
        &self.registry
    }

    /// Initialize the engine for `directory` once per process.
    pub fn ensure_engine_initialized(&self, directory: &Path) -> Result<InitOutcome, StorageError> {
        self.registry
            .ensure_initialized(self.engine.as_ref(), directory, self.log_level)
    }

    /// Run `body` against a fresh multi-process handle onto the default store.
    ///
    /// Returns `None` without calling `body` when initialization or open fails. The handle
    /// is released before returning on every path, including a panicking `body`.
    pub fn with_default_store<T>(
        &self,
        directory: &Path,
        body: impl FnOnce(&dyn KeyValueHandle) -> T,
    ) -> Option<T> {
        match self.try_with_default_store(directory, body) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(
                    category = %self.profile.log_category,
                    directory = %directory.display(),
                    map_id = %self.map_id,
                    error = %e,
                    "Failed to open key-value store"
                );
                None
            }
        }
    }

    pub fn try_with_default_store<T>(
        &self,
        directory: &Path,
        body: impl FnOnce(&dyn KeyValueHandle) -> T,
    ) -> Result<T, StorageError> {
        let span = tracing::debug_span!(
            "kv_session",
            category = %self.profile.log_category,
            directory = %directory.display()
        );
        let _enter = span.enter();

        self.ensure_engine_initialized(directory)?;
        let handle = self
            .engine
            .open(directory, &self.map_id, AccessMode::MultiProcess)?;
        tracing::debug!(map_id = %self.map_id, "Opened key-value handle");

        let guard = HandleGuard {
            handle,
            policy: self.profile.cleanup_policy,
        };
        Ok(body(guard.handle.as_ref()))
    }

    /// Read `key` as a string; a missing key or a failed read yields `None`.
    pub fn read_string(handle: &dyn KeyValueHandle, key: &str) -> Option<String> {
        match handle.read_string(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Key-value read failed");
                None
            }
        }
    }
}

/// Releases the handle when the operation scope ends.
struct HandleGuard {
    handle: Box<dyn KeyValueHandle>,
    policy: CleanupPolicy,
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        if self.policy.clears_cache() {
            self.handle.clear_memory_cache();
        }
        self.handle.close();
        tracing::debug!("Released key-value handle");
    }
}

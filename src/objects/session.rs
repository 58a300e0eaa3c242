//! Scoped read-only snapshots.

use super::engine::{ObjectSnapshot, ObjectStoreEngine};
use crate::error::StorageError;
use crate::session::SessionProfile;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default object-store file name inside the shared container
pub const DEFAULT_STORE_FILE: &str = "default.store";

pub struct ObjectStoreSession {
    engine: Arc<dyn ObjectStoreEngine>,
    profile: SessionProfile,
    file_name: String,
}

impl ObjectStoreSession {
    pub fn new(engine: Arc<dyn ObjectStoreEngine>, profile: SessionProfile) -> Self {
        Self {
            engine,
            profile,
            file_name: DEFAULT_STORE_FILE.to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn profile(&self) -> &SessionProfile {
        &self.profile
    }

    /// Schema version this session's profile was configured with
    pub fn schema_version(&self) -> u64 {
        self.profile.schema_version
    }

    pub fn store_file(&self, directory: &Path) -> PathBuf {
        directory.join(&self.file_name)
    }

    /// Run `body` against a read-only snapshot of `<directory>/<file_name>`.
    ///
    /// Returns `None` without calling `body` if the store cannot be opened at
    /// `schema_version`. The snapshot is invalidated before returning on every path.
    pub fn with_read_only_snapshot<T>(
        &self,
        directory: &Path,
        schema_version: u64,
        body: impl FnOnce(&dyn ObjectSnapshot) -> T,
    ) -> Option<T> {
        match self.try_with_read_only_snapshot(directory, schema_version, body) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(
                    category = %self.profile.log_category,
                    file = %self.store_file(directory).display(),
                    schema_version,
                    error = %e,
                    "Failed to open object store"
                );
                None
            }
        }
    }

    pub fn try_with_read_only_snapshot<T>(
        &self,
        directory: &Path,
        schema_version: u64,
        body: impl FnOnce(&dyn ObjectSnapshot) -> T,
    ) -> Result<T, StorageError> {
        let file = self.store_file(directory);
        let span = tracing::debug_span!(
            "object_store_session",
            category = %self.profile.log_category,
            file = %file.display(),
            schema_version
        );
        let _enter = span.enter();

        let snapshot = self.engine.open_read_only(&file, schema_version)?;
        tracing::debug!("Opened read-only snapshot");

        let guard = SnapshotGuard { snapshot };
        Ok(body(guard.snapshot.as_ref()))
    }
}

/// Invalidates the snapshot when the operation scope ends.
struct SnapshotGuard {
    snapshot: Box<dyn ObjectSnapshot>,
}

impl Drop for SnapshotGuard {
    fn drop(&mut self) {
        self.snapshot.invalidate();
        tracing::debug!("Invalidated snapshot");
    }
}

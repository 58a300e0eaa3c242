//! Shared-Container Resolver
//!
//! Maps a host application identifier to the application-group directory shared by the
//! main process and its extensions. Every other component starts here; an unresolvable
//! container means "data unavailable", never a fatal fault.

use crate::error::AccessError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Resolves host application identifiers to shared container directories
pub trait ContainerResolver: Send + Sync {
    /// Resolve the shared container for `host_app_id`, or `None` if none exists.
    fn resolve(&self, host_app_id: &str) -> Option<PathBuf>;
}

/// Derive the shared group name for a host application identifier.
pub fn group_identifier(prefix: &str, host_app_id: &str) -> String {
    format!("{}.{}", prefix, host_app_id)
}

/// Resolve a container or report it as unavailable, logging the failure.
pub fn require_container(
    resolver: &dyn ContainerResolver,
    host_app_id: &str,
) -> Result<PathBuf, AccessError> {
    resolver.resolve(host_app_id).ok_or_else(|| {
        tracing::error!(host_app_id, "Shared container unavailable");
        AccessError::UnavailableContainer(host_app_id.to_string())
    })
}

/// Resolver over a root directory holding one sub-directory per application group.
///
/// `<root>/<prefix>.<host_app_id>` must already exist; the producer process creates it.
/// Successful resolutions are memoized because the mapping does not change while the
/// process runs. Misses are re-checked on every call.
pub struct DirectoryContainerResolver {
    root: PathBuf,
    group_prefix: String,
    resolved: RwLock<HashMap<String, PathBuf>>,
}

impl DirectoryContainerResolver {
    pub fn new<P: AsRef<Path>>(root: P, group_prefix: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            group_prefix: group_prefix.into(),
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// Default root: `<platform data dir>/shared-store/containers`.
    pub fn default_root() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "shared-store")
            .map(|dirs| dirs.data_dir().join("containers"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContainerResolver for DirectoryContainerResolver {
    fn resolve(&self, host_app_id: &str) -> Option<PathBuf> {
        if host_app_id.is_empty() {
            return None;
        }
        if let Some(path) = self.resolved.read().get(host_app_id) {
            return Some(path.clone());
        }

        let group = group_identifier(&self.group_prefix, host_app_id);
        let candidate = self.root.join(&group);
        if !candidate.is_dir() {
            tracing::debug!(host_app_id, group = %group, "No container directory for group");
            return None;
        }
        let path = dunce::canonicalize(&candidate).unwrap_or(candidate);

        self.resolved
            .write()
            .entry(host_app_id.to_string())
            .or_insert_with(|| path.clone());
        Some(path)
    }
}

//! SQLite-backed key-value engine.
//!
//! Each named store is the file `<group_dir>/<kv_dir>/<map_id>.db` holding a single
//! `entries (key TEXT PRIMARY KEY, value)` table whose values are UTF-8 text or blobs.
//! Handles are read-only connections, so concurrent handles on one store never contend
//! with each other and never write to the producer's files.

use super::engine::{AccessMode, EngineLogLevel, KeyValueEngine, KeyValueHandle};
use crate::error::StorageError;
use crate::sqlite::{open_error, open_read_only};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Default sub-directory of the shared container holding key-value stores
pub const DEFAULT_KV_DIR: &str = "kv";

pub const ENTRIES_TABLE: &str = "entries";

const STORE_EXTENSION: &str = "db";

pub struct SqliteKeyValueEngine {
    kv_dir: String,
}

impl SqliteKeyValueEngine {
    pub fn new(kv_dir: impl Into<String>) -> Self {
        Self {
            kv_dir: kv_dir.into(),
        }
    }

    /// Location of the store named `map_id` inside `group_dir`.
    pub fn store_path(&self, group_dir: &Path, map_id: &str) -> PathBuf {
        group_dir
            .join(&self.kv_dir)
            .join(format!("{}.{}", map_id, STORE_EXTENSION))
    }
}

impl Default for SqliteKeyValueEngine {
    fn default() -> Self {
        Self::new(DEFAULT_KV_DIR)
    }
}

impl KeyValueEngine for SqliteKeyValueEngine {
    fn initialize(&self, group_dir: &Path, log_level: EngineLogLevel) -> Result<(), StorageError> {
        if !group_dir.is_dir() {
            return Err(StorageError::EngineInit {
                directory: group_dir.to_path_buf(),
                reason: "group directory does not exist".to_string(),
            });
        }
        tracing::debug!(
            directory = %group_dir.display(),
            log_level = ?log_level,
            "SQLite key-value engine bound to group directory"
        );
        Ok(())
    }

    fn open(
        &self,
        group_dir: &Path,
        map_id: &str,
        mode: AccessMode,
    ) -> Result<Box<dyn KeyValueHandle>, StorageError> {
        let path = self.store_path(group_dir, map_id);
        let conn = open_read_only(&path)?;
        tracing::trace!(path = %path.display(), mode = ?mode, "Opened key-value store");

        Ok(Box::new(SqliteKeyValueHandle {
            conn: Some(conn),
            path,
        }))
    }
}

struct SqliteKeyValueHandle {
    conn: Option<Connection>,
    path: PathBuf,
}

impl KeyValueHandle for SqliteKeyValueHandle {
    fn read_string(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.as_ref().ok_or(StorageError::Invalidated)?;
        let mut stmt = conn
            .prepare_cached("SELECT value FROM entries WHERE key = ?1")
            .map_err(|e| open_error(&self.path, e))?;

        let raw = stmt
            .query_row([key], |row| {
                Ok(match row.get_ref(0)? {
                    ValueRef::Text(bytes) | ValueRef::Blob(bytes) => Some(bytes.to_vec()),
                    _ => None,
                })
            })
            .optional()
            .map_err(|e| StorageError::EngineOpen {
                path: self.path.clone(),
                reason: format!("Failed to read key {}: {}", key, e),
            })?;

        match raw {
            None => Ok(None),
            Some(None) => Err(StorageError::Corrupt(format!(
                "Value for {} is neither text nor blob",
                key
            ))),
            Some(Some(bytes)) => String::from_utf8(bytes).map(Some).map_err(|e| {
                StorageError::Corrupt(format!("Value for {} is not UTF-8: {}", key, e))
            }),
        }
    }

    fn clear_memory_cache(&mut self) {
        if let Some(conn) = self.conn.as_ref() {
            conn.flush_prepared_statement_cache();
        }
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                tracing::warn!(path = %self.path.display(), error = %e, "Key-value store close failed");
            }
        }
    }
}

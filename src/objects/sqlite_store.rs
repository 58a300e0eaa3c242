//! SQLite-backed object store.
//!
//! Layout of the store file:
//! - `meta (key TEXT PRIMARY KEY, value TEXT)`: `schema_version` as a decimal string
//! - `Contact (username TEXT PRIMARY KEY, name TEXT NOT NULL, user_id TEXT)`
//!
//! A snapshot is a read-only connection inside one deferred read transaction, so the
//! schema check and every query see the same committed state. The writer lives in
//! another process; nothing here writes, and a missing `Contact` table reads as empty.

use super::engine::{ContactPredicate, ContactRecord, ObjectSnapshot, ObjectStoreEngine, StoredContact};
use crate::error::StorageError;
use crate::sqlite::{has_table, open_error, open_read_only};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

pub const META_TABLE: &str = "meta";
pub const SCHEMA_VERSION_KEY: &str = "schema_version";
pub const CONTACT_TABLE: &str = "Contact";

#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteObjectStore;

impl SqliteObjectStore {
    pub fn new() -> Self {
        Self
    }
}

fn read_schema_version(conn: &Connection, path: &Path) -> Result<u64, StorageError> {
    if !has_table(conn, path, META_TABLE)? {
        return Err(StorageError::Corrupt(format!(
            "{} has no {} table",
            path.display(),
            META_TABLE
        )));
    }
    let raw: String = conn
        .query_row(
            "SELECT value FROM meta WHERE key = ?1",
            [SCHEMA_VERSION_KEY],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| open_error(path, e))?
        .ok_or_else(|| StorageError::Corrupt(format!("{} has no schema version", path.display())))?;

    raw.trim().parse::<u64>().map_err(|_| {
        StorageError::Corrupt(format!(
            "Schema version {:?} in {} is not an integer",
            raw,
            path.display()
        ))
    })
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<StoredContact> {
    Ok(StoredContact {
        username: row.get(0)?,
        name: row.get(1)?,
        user_id: row.get(2)?,
    })
}

impl ObjectStoreEngine for SqliteObjectStore {
    fn open_read_only(
        &self,
        file: &Path,
        schema_version: u64,
    ) -> Result<Box<dyn ObjectSnapshot>, StorageError> {
        let conn = open_read_only(file)?;
        conn.execute_batch("BEGIN DEFERRED")
            .map_err(|e| open_error(file, e))?;

        let found = read_schema_version(&conn, file)?;
        if found != schema_version {
            return Err(StorageError::SchemaMismatch {
                expected: schema_version,
                found,
            });
        }
        let has_contacts = has_table(&conn, file, CONTACT_TABLE)?;

        Ok(Box::new(SqliteSnapshot {
            conn: Some(conn),
            has_contacts,
            path: file.to_path_buf(),
            schema_version,
        }))
    }
}

struct SqliteSnapshot {
    conn: Option<Connection>,
    has_contacts: bool,
    path: PathBuf,
    schema_version: u64,
}

impl ObjectSnapshot for SqliteSnapshot {
    fn schema_version(&self) -> u64 {
        self.schema_version
    }

    fn query_contacts(
        &self,
        predicate: &ContactPredicate,
    ) -> Result<Vec<ContactRecord<'_>>, StorageError> {
        let conn = self.conn.as_ref().ok_or(StorageError::Invalidated)?;
        if !self.has_contacts {
            return Ok(Vec::new());
        }

        if let ContactPredicate::UsernameEquals(username) = predicate {
            let row = conn
                .query_row(
                    "SELECT username, name, user_id FROM Contact WHERE username = ?1",
                    [username],
                    contact_from_row,
                )
                .optional()
                .map_err(|e| open_error(&self.path, e))?;
            return Ok(row.into_iter().map(ContactRecord::new).collect());
        }

        let mut stmt = conn
            .prepare("SELECT username, name, user_id FROM Contact ORDER BY rowid")
            .map_err(|e| open_error(&self.path, e))?;
        let rows = stmt
            .query_map([], contact_from_row)
            .map_err(|e| open_error(&self.path, e))?;

        let mut out = Vec::new();
        for row in rows {
            let row = row.map_err(|e| {
                StorageError::Corrupt(format!(
                    "Unreadable contact in {}: {}",
                    self.path.display(),
                    e
                ))
            })?;
            if predicate.matches(&row) {
                out.push(ContactRecord::new(row));
            }
        }
        Ok(out)
    }

    fn invalidate(&mut self) {
        // Closing the connection ends the read transaction.
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                tracing::warn!(path = %self.path.display(), error = %e, "Object store close failed");
            }
        }
    }
}

//! Read-only SQLite connections onto producer-owned store files.
//!
//! Connections are opened with `SQLITE_OPEN_READ_ONLY`: SQLite never creates the file,
//! never takes a write lock and never writes a journal from these connections. Any
//! number of them may be open on the same file, in this process or others, next to a
//! writer. Producers that use WAL mode must keep the `-shm` file in place while readers
//! run.

use crate::error::StorageError;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;

/// How long a read waits on a writer holding the database lock
pub const READ_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn open_error(path: &Path, e: impl std::fmt::Display) -> StorageError {
    StorageError::EngineOpen {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Open `path` read-only, failing with [`StorageError::MissingStore`] if it is absent.
pub(crate) fn open_read_only(path: &Path) -> Result<Connection, StorageError> {
    if !path.is_file() {
        return Err(StorageError::MissingStore(path.to_path_buf()));
    }

    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| open_error(path, e))?;
    conn.busy_timeout(READ_BUSY_TIMEOUT)
        .map_err(|e| open_error(path, e))?;
    Ok(conn)
}

/// Whether `table` exists in the schema of `conn`.
pub(crate) fn has_table(conn: &Connection, path: &Path, table: &str) -> Result<bool, StorageError> {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get::<_, i64>(0),
    )
    .map(|count| count > 0)
    .map_err(|e| open_error(path, e))
}

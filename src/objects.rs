//! ObjectStore Session
//!
//! Read-only, schema-versioned snapshots of the embedded object store in the shared
//! container. Records handed out by a snapshot borrow it, so they have to be detached
//! into plain values before the snapshot scope ends.

pub mod engine;
pub mod session;
pub mod sqlite_store;

pub use engine::{ContactPredicate, ContactRecord, ObjectSnapshot, ObjectStoreEngine, StoredContact};
pub use session::ObjectStoreSession;
pub use sqlite_store::SqliteObjectStore;

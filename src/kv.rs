//! KeyValue Session
//!
//! Short-lived access to the multi-process key-value engine that lives in the shared
//! container. The engine may be opened at the same time by unrelated subsystems of the
//! host process under the same store name, so handles never outlive one operation and
//! the only global state touched is the per-directory initialization record.

pub mod engine;
pub mod init;
pub mod session;
pub mod sqlite_engine;

pub use engine::{AccessMode, EngineLogLevel, KeyValueEngine, KeyValueHandle};
pub use init::{EngineInitRegistry, InitOutcome};
pub use session::{KeyValueSession, DEFAULT_MAP_ID};
pub use sqlite_engine::SqliteKeyValueEngine;

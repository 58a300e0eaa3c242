//! Shared Store: process-shared state for an application family
//!
//! Read-only access to the state a main application shares with its extension processes
//! through an application-group container: the bearer token kept in a multi-process
//! key-value store and contact records in an embedded object store. Every handle and
//! snapshot is scoped to a single call and released before it returns.

pub mod actions;
pub mod api;
pub mod config;
pub mod contacts;
pub mod container;
pub mod error;
pub mod host;
pub mod kv;
pub mod logging;
pub mod media;
pub mod objects;
pub mod session;
pub mod sqlite;
pub mod token;
pub mod transport;

pub use api::{SharedStore, StoreParts};
pub use config::{ConfigLoader, SharedStoreConfig};
pub use contacts::Contact;
pub use error::{AccessError, StorageError, TokenError, TransportError};
pub use session::{CleanupPolicy, SessionProfile};

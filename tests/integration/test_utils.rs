//! Shared test utilities for integration tests
//!
//! Builds a [`SharedStore`] over a temporary container root with counting wrappers around
//! the SQLite engines and a scripted transport, plus writers for on-disk fixtures.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use shared_store::container::DirectoryContainerResolver;
use shared_store::error::{StorageError, TransportError};
use shared_store::host::HostConfig;
use shared_store::kv::{
    AccessMode, EngineInitRegistry, EngineLogLevel, KeyValueEngine, KeyValueHandle,
    SqliteKeyValueEngine,
};
use shared_store::objects::{
    ContactPredicate, ContactRecord, ObjectSnapshot, ObjectStoreEngine, SqliteObjectStore,
    StoredContact,
};
use shared_store::transport::{HttpRequest, HttpTransport};
use shared_store::{SessionProfile, SharedStore, SharedStoreConfig, StoreParts};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;
use tempfile::TempDir;

pub const HOST_APP: &str = "com.example.app";
pub const UNKNOWN_APP: &str = "com.example.missing";
pub const BASE_URL: &str = "https://api.example.com/";
pub const SCHEMA_VERSION: u64 = 206;

/// Encode a three-segment token with the given payload.
pub fn make_token(payload: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    )
}

/// Write `entries` into the default key-value store of `container`, as the producing
/// application would.
pub fn write_entries(container: &Path, entries: &[(&str, &str)]) {
    let dir = container.join("kv");
    std::fs::create_dir_all(&dir).unwrap();
    let conn = Connection::open(dir.join("default.db")).unwrap();
    conn.execute_batch("CREATE TABLE IF NOT EXISTS entries (key TEXT PRIMARY KEY, value);")
        .unwrap();
    for (key, value) in entries {
        conn.execute(
            "INSERT OR REPLACE INTO entries (key, value) VALUES (?1, ?2)",
            params![key, value],
        )
        .unwrap();
    }
}

pub fn write_token(container: &Path, token: &str) {
    write_entries(container, &[("Token", token)]);
}

/// Write an object store file holding `rows` at `schema_version`.
pub fn write_contacts(container: &Path, schema_version: u64, rows: &[StoredContact]) {
    let conn = Connection::open(container.join("default.store")).unwrap();
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);
         CREATE TABLE IF NOT EXISTS Contact (username TEXT PRIMARY KEY, name TEXT NOT NULL, user_id TEXT);",
    )
    .unwrap();
    conn.execute(
        "INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', ?1)",
        params![schema_version.to_string()],
    )
    .unwrap();
    for row in rows {
        conn.execute(
            "INSERT OR REPLACE INTO Contact (username, name, user_id) VALUES (?1, ?2, ?3)",
            params![row.username, row.name, row.user_id],
        )
        .unwrap();
    }
}

pub fn stored(username: &str, name: &str, user_id: Option<&str>) -> StoredContact {
    StoredContact {
        username: username.to_string(),
        name: name.to_string(),
        user_id: user_id.map(str::to_string),
    }
}

/// SQLite key-value engine that counts lifecycle calls
#[derive(Default)]
pub struct CountingKvEngine {
    inner: SqliteKeyValueEngine,
    pub inits: AtomicUsize,
    pub opens: AtomicUsize,
    pub open_threads: Mutex<Vec<ThreadId>>,
    pub closes: Arc<AtomicUsize>,
    pub cache_clears: Arc<AtomicUsize>,
}

impl CountingKvEngine {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }
}

impl KeyValueEngine for CountingKvEngine {
    fn initialize(&self, group_dir: &Path, log_level: EngineLogLevel) -> Result<(), StorageError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        self.inner.initialize(group_dir, log_level)
    }

    fn open(
        &self,
        group_dir: &Path,
        map_id: &str,
        mode: AccessMode,
    ) -> Result<Box<dyn KeyValueHandle>, StorageError> {
        self.open_threads.lock().push(std::thread::current().id());
        let handle = self.inner.open(group_dir, map_id, mode)?;
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingHandle {
            inner: handle,
            closes: Arc::clone(&self.closes),
            cache_clears: Arc::clone(&self.cache_clears),
        }))
    }
}

struct CountingHandle {
    inner: Box<dyn KeyValueHandle>,
    closes: Arc<AtomicUsize>,
    cache_clears: Arc<AtomicUsize>,
}

impl KeyValueHandle for CountingHandle {
    fn read_string(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.read_string(key)
    }

    fn clear_memory_cache(&mut self) {
        self.cache_clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear_memory_cache();
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close();
    }
}

/// SQLite object store that counts snapshots opened and invalidated
#[derive(Default)]
pub struct CountingObjectStore {
    inner: SqliteObjectStore,
    pub opens: AtomicUsize,
    pub invalidations: Arc<AtomicUsize>,
}

impl CountingObjectStore {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl ObjectStoreEngine for CountingObjectStore {
    fn open_read_only(
        &self,
        file: &Path,
        schema_version: u64,
    ) -> Result<Box<dyn ObjectSnapshot>, StorageError> {
        let snapshot = self.inner.open_read_only(file, schema_version)?;
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingSnapshot {
            inner: snapshot,
            invalidations: Arc::clone(&self.invalidations),
        }))
    }
}

struct CountingSnapshot {
    inner: Box<dyn ObjectSnapshot>,
    invalidations: Arc<AtomicUsize>,
}

impl ObjectSnapshot for CountingSnapshot {
    fn schema_version(&self) -> u64 {
        self.inner.schema_version()
    }

    fn query_contacts(
        &self,
        predicate: &ContactPredicate,
    ) -> Result<Vec<ContactRecord<'_>>, StorageError> {
        self.inner.query_contacts(predicate)
    }

    fn invalidate(&mut self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate();
    }
}

/// Transport that records requests and replies from a script
pub struct MockTransport {
    reply: Mutex<Result<u16, TransportError>>,
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn replying(reply: Result<u16, TransportError>) -> Self {
        Self {
            reply: Mutex::new(reply),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_reply(&self, reply: Result<u16, TransportError>) {
        *self.reply.lock() = reply;
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<u16, TransportError> {
        self.requests.lock().push(request);
        self.reply.lock().clone()
    }
}

/// A store wired to counting doubles over a temporary container root
pub struct Harness {
    pub store: SharedStore,
    pub kv: Arc<CountingKvEngine>,
    pub objects: Arc<CountingObjectStore>,
    pub transport: Arc<MockTransport>,
    pub registry: Arc<EngineInitRegistry>,
    pub container: PathBuf,
    _temp: TempDir,
}

impl Harness {
    /// Container for [`HOST_APP`] exists; the API base address is configured.
    pub fn new() -> Self {
        Self::with_host(HostConfig::with_base_url(BASE_URL))
    }

    pub fn with_host(host: HostConfig) -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("containers");
        let container = root.join(format!("group.{}", HOST_APP));
        std::fs::create_dir_all(&container).unwrap();

        let mut config = SharedStoreConfig::new(SessionProfile::new("integration", SCHEMA_VERSION));
        config.host = host;
        config.container.root = Some(root.clone());

        let kv = Arc::new(CountingKvEngine::default());
        let objects = Arc::new(CountingObjectStore::default());
        let transport = Arc::new(MockTransport::replying(Ok(200)));
        let registry = Arc::new(EngineInitRegistry::new());

        let store = SharedStore::from_parts(
            config,
            StoreParts {
                resolver: Arc::new(DirectoryContainerResolver::new(&root, "group")),
                key_value: kv.clone(),
                objects: objects.clone(),
                transport: transport.clone(),
                registry: Arc::clone(&registry),
            },
        );

        Self {
            store,
            kv,
            objects,
            transport,
            registry,
            container: dunce::canonicalize(&container).unwrap(),
            _temp: temp,
        }
    }
}

/// Serializes tests that touch HOME / XDG_CONFIG_HOME / SHARED_STORE__* variables
static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

const ISOLATED_VARS: [&str; 3] = ["HOME", "XDG_CONFIG_HOME", "SHARED_STORE__PROFILE__SCHEMA_VERSION"];

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir`, restoring both after.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ISOLATED_VARS
        .iter()
        .map(|k| (*k, std::env::var(k).ok()))
        .collect();

    let test_home = test_dir.path().join("home");
    let test_config_home = test_dir.path().join("xdg");
    std::fs::create_dir_all(&test_home).unwrap();
    std::fs::create_dir_all(&test_config_home).unwrap();
    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", &test_config_home);
    std::env::remove_var("SHARED_STORE__PROFILE__SCHEMA_VERSION");

    let result = f();

    for (k, v) in saved {
        match v {
            Some(v) => std::env::set_var(k, v),
            None => std::env::remove_var(k),
        }
    }
    result
}

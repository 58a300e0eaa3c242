//! Shared store API
//!
//! One entry point wiring every component from a single configuration. Hosts that bring
//! their own engines or transport use [`SharedStore::from_parts`].

use crate::actions::{ActionOutcome, RemoteActionDispatcher};
use crate::config::SharedStoreConfig;
use crate::contacts::{Contact, ContactRepository};
use crate::container::{ContainerResolver, DirectoryContainerResolver};
use crate::error::AccessError;
use crate::host::HostMetadata;
use crate::kv::{EngineInitRegistry, KeyValueEngine, KeyValueSession, SqliteKeyValueEngine};
use crate::media::MediaUrlBuilder;
use crate::objects::{ObjectStoreEngine, ObjectStoreSession, SqliteObjectStore};
use crate::token::{Claims, TokenService};
use crate::transport::{HttpTransport, ReqwestTransport};
use std::collections::HashSet;
use std::sync::Arc;

/// Capabilities injected into [`SharedStore::from_parts`]
pub struct StoreParts {
    pub resolver: Arc<dyn ContainerResolver>,
    pub key_value: Arc<dyn KeyValueEngine>,
    pub objects: Arc<dyn ObjectStoreEngine>,
    pub transport: Arc<dyn HttpTransport>,
    pub registry: Arc<EngineInitRegistry>,
}

pub struct SharedStore {
    config: SharedStoreConfig,
    tokens: Arc<TokenService>,
    contacts: ContactRepository,
    actions: Arc<RemoteActionDispatcher>,
    media: MediaUrlBuilder,
}

impl SharedStore {
    /// Build a store on the SQLite engines, the directory resolver, the process-wide init
    /// registry and the reqwest transport.
    pub fn open(config: SharedStoreConfig) -> Result<Self, AccessError> {
        let config = config.validated()?;
        let root = config
            .container
            .root
            .clone()
            .or_else(DirectoryContainerResolver::default_root)
            .ok_or_else(|| {
                AccessError::ConfigurationMissing("container root directory".to_string())
            })?;

        let parts = StoreParts {
            resolver: Arc::new(DirectoryContainerResolver::new(
                root,
                config.container.group_prefix.clone(),
            )),
            key_value: Arc::new(SqliteKeyValueEngine::new(config.key_value.directory.clone())),
            objects: Arc::new(SqliteObjectStore::new()),
            transport: Arc::new(ReqwestTransport::new()?),
            registry: EngineInitRegistry::global(),
        };
        Ok(Self::from_parts(config, parts))
    }

    pub fn from_parts(config: SharedStoreConfig, parts: StoreParts) -> Self {
        let kv = Arc::new(
            KeyValueSession::new(parts.key_value, parts.registry, config.profile.clone())
                .with_map_id(config.key_value.map_id.clone())
                .with_log_level(config.key_value.log_level),
        );
        let objects = Arc::new(
            ObjectStoreSession::new(parts.objects, config.profile.clone())
                .with_file_name(config.object_store.file_name.clone()),
        );
        let tokens = Arc::new(
            TokenService::new(Arc::clone(&parts.resolver), kv)
                .with_token_key(config.key_value.token_key.clone()),
        );
        let host: Arc<dyn HostMetadata> = Arc::new(config.host.clone());

        let contacts = ContactRepository::new(parts.resolver, objects);
        let actions = Arc::new(
            RemoteActionDispatcher::new(Arc::clone(&host), Arc::clone(&tokens), parts.transport)
                .with_timeout(config.http.timeout()),
        );
        let media = MediaUrlBuilder::new(host, Arc::clone(&tokens));

        Self {
            config,
            tokens,
            contacts,
            actions,
            media,
        }
    }

    pub fn config(&self) -> &SharedStoreConfig {
        &self.config
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    pub fn contacts(&self) -> &ContactRepository {
        &self.contacts
    }

    pub fn actions(&self) -> &Arc<RemoteActionDispatcher> {
        &self.actions
    }

    pub fn media(&self) -> &MediaUrlBuilder {
        &self.media
    }

    pub fn token(&self, host_app_id: &str) -> Option<String> {
        self.tokens.get_token(host_app_id)
    }

    pub fn claims(&self, host_app_id: &str) -> Option<Claims> {
        self.tokens.claims(host_app_id)
    }

    pub fn contact_by_username(&self, username: &str, host_app_id: &str) -> Option<Contact> {
        self.contacts.find_by_username(username, host_app_id)
    }

    pub fn contacts_by_user_ids(
        &self,
        user_ids: &HashSet<String>,
        host_app_id: &str,
    ) -> Vec<Contact> {
        self.contacts.find_by_user_ids(user_ids, host_app_id)
    }

    pub async fn acknowledge_message(
        &self,
        message_id: &str,
        user_id: &str,
        host_app_id: &str,
    ) -> ActionOutcome {
        self.actions
            .acknowledge_message(message_id, user_id, host_app_id)
            .await
    }

    pub async fn reject_call(&self, call_id: &str, host_app_id: &str) -> ActionOutcome {
        self.actions.reject_call(call_id, host_app_id).await
    }

    pub fn image_url(
        &self,
        is_private_group: bool,
        group_id: &str,
        user_id: &str,
        host_app_id: &str,
    ) -> Option<String> {
        self.media
            .build_image_url(is_private_group, group_id, user_id, host_app_id)
    }
}

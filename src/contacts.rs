//! Contact Repository
//!
//! Contact lookups against the shared object store. Everything returned is a detached
//! copy: it holds no reference to the snapshot it came from and does not observe later
//! writes to the store.

use crate::container::{require_container, ContainerResolver};
use crate::error::AccessError;
use crate::objects::{ContactPredicate, ObjectStoreSession};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Detached contact value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contact {
    pub username: String,
    pub name: String,
    pub user_id: Option<String>,
}

pub struct ContactRepository {
    resolver: Arc<dyn ContainerResolver>,
    session: Arc<ObjectStoreSession>,
}

impl ContactRepository {
    pub fn new(resolver: Arc<dyn ContainerResolver>, session: Arc<ObjectStoreSession>) -> Self {
        Self { resolver, session }
    }

    /// The contact whose username is `username`, if any.
    pub fn find_by_username(&self, username: &str, host_app_id: &str) -> Option<Contact> {
        self.try_find_by_username(username, host_app_id)
            .unwrap_or_else(|e| {
                tracing::warn!(host_app_id, error = %e, "Contact lookup by username failed");
                None
            })
    }

    pub fn try_find_by_username(
        &self,
        username: &str,
        host_app_id: &str,
    ) -> Result<Option<Contact>, AccessError> {
        let directory = require_container(self.resolver.as_ref(), host_app_id)?;
        let predicate = ContactPredicate::UsernameEquals(username.to_string());

        let found = self.session.try_with_read_only_snapshot(
            &directory,
            self.session.schema_version(),
            |snapshot| {
                snapshot
                    .query_contacts(&predicate)
                    .map(|records| records.first().map(|r| r.detach()))
            },
        )??;
        Ok(found)
    }

    /// Every contact whose `user_id` is in `user_ids`, in store enumeration order.
    ///
    /// An empty set returns immediately without touching the container or the store.
    pub fn find_by_user_ids(&self, user_ids: &HashSet<String>, host_app_id: &str) -> Vec<Contact> {
        self.try_find_by_user_ids(user_ids, host_app_id)
            .unwrap_or_else(|e| {
                tracing::warn!(
                    host_app_id,
                    requested = user_ids.len(),
                    error = %e,
                    "Contact lookup by user ids failed"
                );
                Vec::new()
            })
    }

    pub fn try_find_by_user_ids(
        &self,
        user_ids: &HashSet<String>,
        host_app_id: &str,
    ) -> Result<Vec<Contact>, AccessError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let directory = require_container(self.resolver.as_ref(), host_app_id)?;
        let ids: BTreeSet<String> = user_ids.iter().cloned().collect();
        let predicate = ContactPredicate::UserIdIn(ids);

        let found = self.session.try_with_read_only_snapshot(
            &directory,
            self.session.schema_version(),
            |snapshot| {
                snapshot
                    .query_contacts(&predicate)
                    .map(|records| records.iter().map(|r| r.detach()).collect::<Vec<_>>())
            },
        )??;
        tracing::debug!(host_app_id, requested = user_ids.len(), found = found.len(), "Contacts loaded");
        Ok(found)
    }
}

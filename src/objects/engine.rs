//! Object-store engine capability

use crate::contacts::Contact;
use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::path::Path;

/// Contact row as the writer persists it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContact {
    pub username: String,
    pub name: String,
    pub user_id: Option<String>,
}

/// Query predicates over the contact table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactPredicate {
    UsernameEquals(String),
    UserIdIn(BTreeSet<String>),
}

impl ContactPredicate {
    pub fn matches(&self, contact: &StoredContact) -> bool {
        match self {
            ContactPredicate::UsernameEquals(username) => contact.username == *username,
            ContactPredicate::UserIdIn(ids) => contact
                .user_id
                .as_ref()
                .map(|id| ids.contains(id))
                .unwrap_or(false),
        }
    }
}

/// A contact as seen through an open snapshot.
///
/// Valid only while the snapshot that produced it is open; [`ContactRecord::detach`]
/// copies it out.
#[derive(Debug)]
pub struct ContactRecord<'s> {
    row: StoredContact,
    _snapshot: PhantomData<&'s ()>,
}

impl<'s> ContactRecord<'s> {
    pub fn new(row: StoredContact) -> Self {
        Self {
            row,
            _snapshot: PhantomData,
        }
    }

    pub fn username(&self) -> &str {
        &self.row.username
    }

    pub fn name(&self) -> &str {
        &self.row.name
    }

    pub fn user_id(&self) -> Option<&str> {
        self.row.user_id.as_deref()
    }

    /// Copy the record field by field into an independently owned value.
    pub fn detach(&self) -> Contact {
        Contact {
            username: self.row.username.clone(),
            name: self.row.name.clone(),
            user_id: self.row.user_id.clone(),
        }
    }
}

/// Embedded object-store engine
pub trait ObjectStoreEngine: Send + Sync {
    /// Open the store file read-only at exactly `schema_version`.
    fn open_read_only(
        &self,
        file: &Path,
        schema_version: u64,
    ) -> Result<Box<dyn ObjectSnapshot>, StorageError>;
}

/// Read-only snapshot of the store
pub trait ObjectSnapshot: Send {
    fn schema_version(&self) -> u64;

    /// Contacts matching `predicate`, in the store's enumeration order.
    fn query_contacts(
        &self,
        predicate: &ContactPredicate,
    ) -> Result<Vec<ContactRecord<'_>>, StorageError>;

    /// Invalidate the snapshot; later queries fail.
    fn invalidate(&mut self);
}

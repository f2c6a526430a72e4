use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::{KeyValueStore, MemoryStore};

/// Key under which the bearer token is stored in either slot
pub const TOKEN_KEY: &str = "jwt_token";

/// Which slot holds the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Cleared when the process ends
    Ephemeral,
    /// Survives restarts
    Durable,
}

impl PersistenceMode {
    pub fn from_remember_me(remember_me: bool) -> Self {
        if remember_me {
            PersistenceMode::Durable
        } else {
            PersistenceMode::Ephemeral
        }
    }
}

/// Holds at most one live bearer credential across a durable and an
/// ephemeral slot. All credential mutation goes through `set` and `clear`.
pub struct CredentialStore {
    durable: Arc<dyn KeyValueStore>,
    ephemeral: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(durable: Arc<dyn KeyValueStore>, ephemeral: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, ephemeral }
    }

    /// Both slots in memory. Used by tests and throwaway sessions.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// The current credential, durable slot first.
    pub fn get(&self) -> Option<String> {
        self.durable
            .get(TOKEN_KEY)
            .or_else(|| self.ephemeral.get(TOKEN_KEY))
    }

    /// Store a credential in exactly one slot, clearing the other.
    pub fn set(&self, credential: &str, persistent: bool) {
        if persistent {
            self.durable.set(TOKEN_KEY, credential);
            self.ephemeral.remove(TOKEN_KEY);
        } else {
            self.ephemeral.set(TOKEN_KEY, credential);
            self.durable.remove(TOKEN_KEY);
        }
        debug!(
            mode = ?PersistenceMode::from_remember_me(persistent),
            "Stored credential"
        );
    }

    /// Remove the credential from both slots.
    pub fn clear(&self) {
        self.durable.remove(TOKEN_KEY);
        self.ephemeral.remove(TOKEN_KEY);
        debug!("Cleared credential");
    }

    /// Check if a credential exists in either slot
    pub fn has_credential(&self) -> bool {
        self.get().is_some()
    }

    /// Which slot currently holds the credential
    pub fn mode(&self) -> Option<PersistenceMode> {
        if self.durable.get(TOKEN_KEY).is_some() {
            Some(PersistenceMode::Durable)
        } else if self.ephemeral.get(TOKEN_KEY).is_some() {
            Some(PersistenceMode::Ephemeral)
        } else {
            None
        }
    }

    /// The durable slot, shared with preferences such as the UI language.
    pub fn durable_slot(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.durable)
    }
}

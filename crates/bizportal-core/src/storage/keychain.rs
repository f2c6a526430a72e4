use keyring::Entry;
use tracing::warn;

use super::KeyValueStore;

/// Durable slot storage in the OS keychain, one entry per key.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Option<Entry> {
        match Entry::new(&self.service, key) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(service = %self.service, key = key, error = %e, "Failed to create keyring entry");
                None
            }
        }
    }
}

impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.entry(key)?.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read from keychain");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(entry) = self.entry(key) {
            if let Err(e) = entry.set_password(value) {
                warn!(key = key, error = %e, "Failed to store value in keychain");
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(entry) = self.entry(key) {
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => warn!(key = key, error = %e, "Failed to delete value from keychain"),
            }
        }
    }

    fn name(&self) -> &str {
        "keyring"
    }
}

//! Key/value slot storage backing the credential store and preferences.
//!
//! This module provides:
//! - `KeyValueStore`: the slot storage trait
//! - `MemoryStore`: process-lifetime storage (the ephemeral slot)
//! - `FileStore`: JSON file storage, optionally sealed with a passphrase
//! - `KeyringStore`: OS keychain storage
//!
//! Backends never surface errors from `get`/`set`/`remove`. A backend that
//! cannot read treats the key as absent, and a failed write is logged.

pub mod file;
pub mod keychain;
pub mod memory;
mod vault;

use std::sync::Arc;

pub use self::file::FileStore;
pub use self::keychain::KeyringStore;
pub use self::memory::MemoryStore;

/// A string key/value slot store.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: &str);

    /// Remove `key`. Removing a missing key is a no-op.
    fn remove(&self, key: &str);

    /// Backend name, used in log fields.
    fn name(&self) -> &str {
        "unknown"
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

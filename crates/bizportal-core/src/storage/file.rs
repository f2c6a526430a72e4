use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::vault::{SealedValue, Vault};
use super::KeyValueStore;

/// Sealed into every encrypted store so a wrong passphrase is caught on open
const PASSPHRASE_CHECK: &str = "bizportal-vault-check";

/// On-disk layout of a file store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FileContents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    salt: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    check: Option<SealedValue>,
    #[serde(default)]
    entries: BTreeMap<String, StoredValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredValue {
    Plain(String),
    Sealed(SealedValue),
}

/// Durable slot storage persisted as a JSON file.
///
/// The whole file is rewritten after every mutation. When opened with a
/// passphrase, values are sealed before they reach the disk and values
/// that cannot be opened read as absent.
pub struct FileStore {
    path: PathBuf,
    vault: Option<Vault>,
    contents: Mutex<FileContents>,
}

impl FileStore {
    /// Open (or lazily create) a plaintext store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = Self::read_contents(&path)?;
        debug!(path = %path.display(), "Opened file store");

        Ok(Self {
            path,
            vault: None,
            contents: Mutex::new(contents),
        })
    }

    /// Open a store whose values are sealed with a key derived from `passphrase`.
    ///
    /// Fails when `passphrase` does not match the one the store was sealed
    /// with, so nothing gets rewritten under the wrong key.
    pub fn open_encrypted(path: impl Into<PathBuf>, passphrase: &str) -> Result<Self> {
        let path = path.into();
        let mut contents = Self::read_contents(&path)?;

        let salt = contents.salt.get_or_insert_with(Vault::new_salt).clone();
        let vault = Vault::derive(passphrase, &salt)?;

        match contents.check {
            Some(ref check) => {
                let verified = vault
                    .open(check)
                    .map(|value| value == PASSPHRASE_CHECK)
                    .unwrap_or(false);
                if !verified {
                    bail!("Wrong passphrase for encrypted store {}", path.display());
                }
            }
            None => {
                // Stores written before the check existed: any sealed value must open
                let sealed: Vec<&SealedValue> = contents
                    .entries
                    .values()
                    .filter_map(|stored| match stored {
                        StoredValue::Sealed(sealed) => Some(sealed),
                        StoredValue::Plain(_) => None,
                    })
                    .collect();
                if !sealed.is_empty() && sealed.iter().all(|value| vault.open(value).is_err()) {
                    bail!("Wrong passphrase for encrypted store {}", path.display());
                }
                // Written out with the next mutation
                contents.check = Some(vault.seal(PASSPHRASE_CHECK)?);
            }
        }
        debug!(path = %path.display(), "Opened encrypted file store");

        Ok(Self {
            path,
            vault: Some(vault),
            contents: Mutex::new(contents),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_contents(path: &Path) -> Result<FileContents> {
        if !path.exists() {
            return Ok(FileContents::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read store file {}", path.display()))?;
        if raw.trim().is_empty() {
            return Ok(FileContents::default());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse store file {}", path.display()))
    }

    fn persist(&self, contents: &FileContents) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(contents)?;
        std::fs::write(&self.path, serialized)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn encode(&self, value: &str) -> Result<StoredValue> {
        match self.vault {
            Some(ref vault) => Ok(StoredValue::Sealed(vault.seal(value)?)),
            None => Ok(StoredValue::Plain(value.to_string())),
        }
    }

    fn decode(&self, key: &str, stored: &StoredValue) -> Option<String> {
        match (stored, &self.vault) {
            (StoredValue::Plain(value), _) => Some(value.clone()),
            (StoredValue::Sealed(sealed), Some(vault)) => match vault.open(sealed) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = key, error = %e, "Discarding unreadable sealed value");
                    None
                }
            },
            (StoredValue::Sealed(_), None) => {
                warn!(key = key, "Sealed value found in a plaintext store");
                None
            }
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let contents = self.contents.lock().ok()?;
        let stored = contents.entries.get(key)?;
        self.decode(key, stored)
    }

    fn set(&self, key: &str, value: &str) {
        let stored = match self.encode(value) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to encode value");
                return;
            }
        };

        if let Ok(mut contents) = self.contents.lock() {
            contents.entries.insert(key.to_string(), stored);
            if let Err(e) = self.persist(&contents) {
                warn!(path = %self.path.display(), error = %e, "Failed to write store file");
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut contents) = self.contents.lock() {
            if contents.entries.remove(key).is_none() {
                return;
            }
            if let Err(e) = self.persist(&contents) {
                warn!(path = %self.path.display(), error = %e, "Failed to write store file");
            }
        }
    }

    fn name(&self) -> &str {
        if self.vault.is_some() {
            "encrypted-file"
        } else {
            "file"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let store = FileStore::open(&path).unwrap();
        store.set("localizationLanguage", "VI");
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("localizationLanguage").as_deref(), Some("VI"));
    }

    #[test]
    fn test_remove_missing_key_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let store = FileStore::open(&path).unwrap();
        store.remove("jwt_token");
        assert!(!path.exists());
    }

    #[test]
    fn test_encrypted_store_never_writes_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.json");

        let store = FileStore::open_encrypted(&path, "passphrase").unwrap();
        store.set("jwt_token", "very-secret-token");
        assert_eq!(store.get("jwt_token").as_deref(), Some("very-secret-token"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("very-secret-token"));

        drop(store);
        let reopened = FileStore::open_encrypted(&path, "passphrase").unwrap();
        assert_eq!(reopened.get("jwt_token").as_deref(), Some("very-secret-token"));
    }

    #[test]
    fn test_wrong_passphrase_rejected_and_values_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.json");

        let store = FileStore::open_encrypted(&path, "right").unwrap();
        store.set("localizationLanguage", "JA");
        drop(store);

        assert!(FileStore::open_encrypted(&path, "wrong").is_err());

        let plain = FileStore::open(&path).unwrap();
        assert!(plain.get("localizationLanguage").is_none());

        let reopened = FileStore::open_encrypted(&path, "right").unwrap();
        assert_eq!(reopened.get("localizationLanguage").as_deref(), Some("JA"));
    }

    #[test]
    fn test_store_without_check_verified_against_sealed_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.json");

        let store = FileStore::open_encrypted(&path, "right").unwrap();
        store.set("jwt_token", "abc");
        drop(store);

        let mut raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        raw.as_object_mut().unwrap().remove("check");
        std::fs::write(&path, raw.to_string()).unwrap();

        assert!(FileStore::open_encrypted(&path, "wrong").is_err());

        let reopened = FileStore::open_encrypted(&path, "right").unwrap();
        assert_eq!(reopened.get("jwt_token").as_deref(), Some("abc"));
        reopened.set("jwt_token", "def");
        drop(reopened);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"check\""));
    }

    #[test]
    fn test_open_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(FileStore::open(&path).is_err());
    }
}

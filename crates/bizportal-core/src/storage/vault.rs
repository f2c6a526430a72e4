use anyhow::{anyhow, Result};
use argon2::Argon2;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use serde::{Deserialize, Serialize};

/// Salt length for Argon2 key derivation
pub(crate) const SALT_LEN: usize = 16;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// A value sealed with ChaCha20-Poly1305.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct SealedValue {
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

/// Symmetric cipher keyed from a passphrase.
pub(crate) struct Vault {
    cipher: ChaCha20Poly1305,
}

impl Vault {
    /// Derive the vault key from `passphrase` and `salt` with Argon2.
    pub fn derive(passphrase: &str, salt: &[u8]) -> Result<Self> {
        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(passphrase.as_bytes(), salt, &mut key)
            .map_err(|e| anyhow!("Failed to derive storage key: {}", e))?;

        Ok(Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
        })
    }

    pub fn new_salt() -> Vec<u8> {
        rand::random::<[u8; SALT_LEN]>().to_vec()
    }

    pub fn seal(&self, plaintext: &str) -> Result<SealedValue> {
        let nonce: [u8; NONCE_LEN] = rand::random();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| anyhow!("Failed to seal value: {}", e))?;

        Ok(SealedValue {
            nonce: nonce.to_vec(),
            ciphertext,
        })
    }

    pub fn open(&self, sealed: &SealedValue) -> Result<String> {
        if sealed.nonce.len() != NONCE_LEN {
            return Err(anyhow!("Sealed value has a malformed nonce"));
        }
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
            .map_err(|e| anyhow!("Failed to open sealed value: {}", e))?;

        Ok(String::from_utf8(plaintext)?)
    }
}

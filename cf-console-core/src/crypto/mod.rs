//! At-rest encryption of credential secrets
//!
//! AES-256-GCM with a key derived from the store password via PBKDF2-HMAC-SHA256.
//! Every sealed value carries its own random salt and nonce.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use pbkdf2::pbkdf2_hmac_array;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{CoreError, CoreResult};

/// OWASP 2023 recommendation for PBKDF2-HMAC-SHA256
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 600_000;
const SALT_LENGTH: usize = 16;
const NONCE_LENGTH: usize = 12;
const KEY_LENGTH: usize = 32; // AES-256

/// Base64 parts of one encrypted value, stored column by column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
}

/// Seals and opens secrets under one password.
#[derive(Clone)]
pub struct SecretBox {
    password: String,
    iterations: u32,
}

impl SecretBox {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }

    /// Override the PBKDF2 work factor. Values sealed under one count only open under the same count.
    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    fn cipher(&self, salt: &[u8]) -> CoreResult<Aes256Gcm> {
        let key = pbkdf2_hmac_array::<Sha256, KEY_LENGTH>(
            self.password.as_bytes(),
            salt,
            self.iterations,
        );
        Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CoreError::StorageError(format!("Failed to create cipher: {e}")))
    }

    pub fn seal(&self, plaintext: &[u8]) -> CoreResult<SealedSecret> {
        let mut salt = [0u8; SALT_LENGTH];
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::rng().fill_bytes(&mut salt);
        rand::rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher(&salt)?
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| CoreError::StorageError(format!("Encryption failed: {e}")))?;

        Ok(SealedSecret {
            salt: BASE64.encode(salt),
            nonce: BASE64.encode(nonce_bytes),
            ciphertext: BASE64.encode(ciphertext),
        })
    }

    pub fn open(&self, sealed: &SealedSecret) -> CoreResult<Vec<u8>> {
        let decode = |field: &str, value: &str| {
            BASE64
                .decode(value)
                .map_err(|e| CoreError::StorageError(format!("Invalid {field}: {e}")))
        };
        let salt = decode("salt", &sealed.salt)?;
        let nonce_bytes = decode("nonce", &sealed.nonce)?;
        let ciphertext = decode("ciphertext", &sealed.ciphertext)?;
        if nonce_bytes.len() != NONCE_LENGTH {
            return Err(CoreError::StorageError(format!(
                "Invalid nonce length {}",
                nonce_bytes.len()
            )));
        }

        self.cipher(&salt)?
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| {
                CoreError::StorageError(
                    "Decryption failed: invalid password or corrupted data".to_string(),
                )
            })
    }
}

// Never print the password.
impl std::fmt::Debug for SecretBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBox")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

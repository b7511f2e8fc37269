//! Key material for model encryption.
//!
//! Holds the AES-256 key and CBC initialization vector used by every
//! cipher session. Key material is created only through validated
//! constructors and is securely zeroed on drop via `zeroize`.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::cipher_types::{IV_SIZE, KEY_SIZE};

/// Errors produced while building or persisting key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyMaterialError {
    #[error("Invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Invalid IV length: expected 16 bytes, got {0}")]
    InvalidIvLength(usize),

    #[error("Secure random source failed: {0}")]
    RandomSource(String),

    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Key file IO error: {0}")]
    KeyFileIo(#[source] std::io::Error),

    #[error("Malformed key file: {0}")]
    KeyFileFormat(String),
}

/// AES-256 key and 128-bit IV pair.
///
/// - Not `Clone`. Sessions borrow it for their whole lifetime.
/// - Zeroised on drop.
/// - `Debug` never prints the bytes, only a fingerprint.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    key: [u8; KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl KeyMaterial {
    /// Fill a fresh key and IV from the operating system CSPRNG.
    pub fn generate() -> Result<Self, KeyMaterialError> {
        let mut material = Self {
            key: [0u8; KEY_SIZE],
            iv: [0u8; IV_SIZE],
        };
        OsRng
            .try_fill_bytes(&mut material.key)
            .map_err(|e| KeyMaterialError::RandomSource(e.to_string()))?;
        OsRng
            .try_fill_bytes(&mut material.iv)
            .map_err(|e| KeyMaterialError::RandomSource(e.to_string()))?;

        tracing::debug!("Generated fresh key material");
        Ok(material)
    }

    /// Build key material from caller-supplied bytes.
    ///
    /// Only the lengths are checked. Weak keys are not rejected here; the
    /// all-zero pair is refused later when a cipher session is opened.
    pub fn from_bytes(key: &[u8], iv: &[u8]) -> Result<Self, KeyMaterialError> {
        if key.len() != KEY_SIZE {
            return Err(KeyMaterialError::InvalidKeyLength(key.len()));
        }
        if iv.len() != IV_SIZE {
            return Err(KeyMaterialError::InvalidIvLength(iv.len()));
        }

        let mut material = Self {
            key: [0u8; KEY_SIZE],
            iv: [0u8; IV_SIZE],
        };
        material.key.copy_from_slice(key);
        material.iv.copy_from_slice(iv);
        Ok(material)
    }

    /// Build key material from hex strings (as stored in key files).
    pub fn from_hex(key_hex: &str, iv_hex: &str) -> Result<Self, KeyMaterialError> {
        let key = Zeroizing::new(
            hex::decode(key_hex.trim()).map_err(|e| KeyMaterialError::InvalidHex(e.to_string()))?,
        );
        let iv = Zeroizing::new(
            hex::decode(iv_hex.trim()).map_err(|e| KeyMaterialError::InvalidHex(e.to_string()))?,
        );
        Self::from_bytes(&key, &iv)
    }

    pub fn key_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    pub fn iv_bytes(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    /// True for the all-zero "unset" sentinel.
    pub fn is_unset(&self) -> bool {
        self.key.iter().chain(self.iv.iter()).all(|&b| b == 0)
    }

    /// Short, non-reversible identifier for audit logs.
    ///
    /// First 8 bytes of SHA-256 over `key || iv`, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.key);
        hasher.update(&self.iv);
        let digest = hasher.finalize();
        hex::encode(&digest[..8])
    }

    /// Emit an audit record for this material if fingerprint logging is enabled.
    pub fn log_fingerprint(&self, enabled: bool, origin: &str) {
        if enabled {
            tracing::info!(fingerprint = %self.fingerprint(), origin, "Key material assigned");
        }
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "key_material_tests.rs"]
mod tests;

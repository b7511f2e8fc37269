//! Protected model loader.
//!
//! Turns an encrypted model file into a parsed model. The decrypted
//! plaintext lives in one buffer owned by the loader and reused across
//! loads; a single lock covers decrypt + parse, so concurrent callers are
//! serialized and never observe each other's plaintext.
//!
//! # Buffer lifecycle
//! - Wiped before every decrypt, so no stale bytes survive into a new load.
//! - Wiped again if decryption fails.
//! - Retained after a parse failure (callers must not assume it is cleared).
//! - Wiped when the loader is dropped.

use parking_lot::Mutex;
use std::path::Path;
use zeroize::{Zeroize, Zeroizing};

use super::deserializer::ModelDeserializer;
use super::loader_types::LoadError;
use crate::protector::{KeyMaterial, StreamCipherEngine};

/// Decrypt-to-memory model loader with an exclusive plaintext buffer.
pub struct ProtectedModelLoader<D: ModelDeserializer> {
    engine: StreamCipherEngine,
    deserializer: D,
    buffer: Mutex<Zeroizing<Vec<u8>>>,
}

impl<D: ModelDeserializer> ProtectedModelLoader<D> {
    pub fn new(deserializer: D) -> Self {
        Self::with_engine(StreamCipherEngine::new(), deserializer)
    }

    pub fn with_engine(engine: StreamCipherEngine, deserializer: D) -> Self {
        Self {
            engine,
            deserializer,
            buffer: Mutex::new(Zeroizing::new(Vec::new())),
        }
    }

    /// Decrypt the model at `path` into the shared buffer and parse it.
    ///
    /// Holds the loader lock for the whole decrypt + parse sequence.
    pub fn load_encrypted(
        &self,
        path: impl AsRef<Path>,
        material: &KeyMaterial,
    ) -> Result<D::Model, LoadError> {
        let path = path.as_ref();
        let mut buffer = self.buffer.lock();
        buffer.zeroize();

        if let Err(e) = self.engine.decrypt_file_to_memory(path, material, &mut buffer) {
            buffer.zeroize();
            tracing::debug!(path = %path.display(), error = %e, "Encrypted model could not be decrypted");
            return Err(LoadError::DecryptionFailed(e));
        }

        let model = self
            .deserializer
            .deserialize(&buffer)
            .map_err(|e| LoadError::ParseFailed(Box::new(e)))?;

        tracing::info!(path = %path.display(), plaintext_bytes = buffer.len(), "Encrypted model loaded");
        Ok(model)
    }

    /// Like [`load_encrypted`](Self::load_encrypted) but reports failure
    /// as `None` after logging it.
    pub fn try_load_encrypted(
        &self,
        path: impl AsRef<Path>,
        material: &KeyMaterial,
    ) -> Option<D::Model> {
        let path = path.as_ref();
        match self.load_encrypted(path, material) {
            Ok(model) => Some(model),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Model load failed");
                None
            }
        }
    }

    /// Parse an already-decrypted buffer without touching the shared one.
    pub fn load_model(&self, bytes: &[u8]) -> Result<D::Model, LoadError> {
        self.deserializer
            .deserialize(bytes)
            .map_err(|e| LoadError::ParseFailed(Box::new(e)))
    }

    /// Length of the plaintext currently held in the shared buffer.
    pub fn buffered_len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn engine(&self) -> &StreamCipherEngine {
        &self.engine
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;

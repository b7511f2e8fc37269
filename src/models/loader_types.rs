//! Error types for the protected model loader.

use crate::protector::CipherError;

/// Opaque parse failure reported by a deserializer.
pub type ParseCause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Model decryption failed: {0}")]
    DecryptionFailed(#[source] CipherError),

    #[error("Model parse failed: {0}")]
    ParseFailed(#[source] ParseCause),
}

impl LoadError {
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, LoadError::DecryptionFailed(_))
    }

    pub fn is_parse_failure(&self) -> bool {
        matches!(self, LoadError::ParseFailed(_))
    }
}

impl From<CipherError> for LoadError {
    fn from(err: CipherError) -> Self {
        LoadError::DecryptionFailed(err)
    }
}

//! Constants, session states, and error definitions for the CBC stream cipher.

/// Encryption key size (256 bits)
pub const KEY_SIZE: usize = 32;
/// IV size (128 bits, one AES block)
pub const IV_SIZE: usize = 16;
/// AES block size
pub const BLOCK_SIZE: usize = 16;
/// Default read chunk for stream operations
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

pub(crate) type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
pub(crate) type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Direction a cipher session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Encrypt => "encrypt",
            Direction::Decrypt => "decrypt",
        }
    }
}

/// Lifecycle of a single cipher session.
///
/// `Initialized -> Updating* -> Finalized -> Closed`. `Closed` is entered
/// when the session is dropped, after its state has been wiped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Initialized,
    Updating,
    Finalized,
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Initialized => "initialized",
            SessionState::Updating => "updating",
            SessionState::Finalized => "finalized",
            SessionState::Closed => "closed",
        }
    }
}

/// Errors for stream encryption and decryption.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("Read error: {0}")]
    IoRead(#[source] std::io::Error),

    #[error("Write error: {0}")]
    IoWrite(#[source] std::io::Error),

    #[error("Cipher initialization failed: {0}")]
    CipherInit(String),

    #[error("Cipher finalization failed: {0}")]
    CipherFinalize(String),

    #[error("Invalid padding (wrong key, wrong IV, or corrupted ciphertext)")]
    Padding,

    #[error("Malformed ciphertext: length {len} is not a positive multiple of 16")]
    MalformedCiphertext { len: u64 },

    #[error("Cipher session already {}", .0.as_str())]
    SessionReuse(SessionState),

    #[error("Key material is unset (all-zero key and IV)")]
    UnsetKeyMaterial,
}

impl CipherError {
    /// True for the errors a wrong key, wrong IV, or damaged file produce.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            CipherError::Padding | CipherError::MalformedCiphertext { .. }
        )
    }
}

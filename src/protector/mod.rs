//! Model file protection.
//!
//! AES-256-CBC at-rest encryption for serialized model files.
//! Split into sub-modules:
//! - `key_material`: key/IV pair, generation and validated construction
//! - `cipher_session`: one streaming CBC context with PKCS#7 padding
//! - `stream_engine`: chunked file/stream encryption and decryption
//! - `key_file`: opt-in key material persistence for the CLI

pub mod cipher_session;
pub mod cipher_types;
pub mod key_file;
pub mod key_material;
pub mod stream_engine;

pub use cipher_session::CipherSession;
pub use cipher_types::{
    CipherError, Direction, SessionState, BLOCK_SIZE, DEFAULT_CHUNK_SIZE, IV_SIZE, KEY_SIZE,
};
pub use key_file::{read_key_file, write_key_file};
pub use key_material::{KeyMaterial, KeyMaterialError};
pub use stream_engine::{encrypted_len, encrypted_output_path, StreamCipherEngine};

//! Model Protector
//!
//! At-rest protection for serialized model files. Models are encrypted
//! offline with AES-256-CBC and decrypted only into memory at load time,
//! where a single locked buffer feeds the model deserializer.
//!
//! ```no_run
//! use model_protector::{KeyMaterial, ProtectedModelLoader, StreamCipherEngine, TfliteDeserializer};
//! use std::path::Path;
//!
//! let material = KeyMaterial::generate()?;
//! StreamCipherEngine::new().encrypt_file(
//!     Path::new("detector.tflite"),
//!     Path::new("detector.enc"),
//!     &material,
//! )?;
//!
//! let loader = ProtectedModelLoader::new(TfliteDeserializer);
//! let model = loader.load_encrypted("detector.enc", &material)?;
//! println!("{} bytes", model.size_bytes());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod models;
pub mod protector;

pub use config::{ConfigError, LogFormat, ProtectorConfig};
pub use models::{
    LoadError, ModelDeserializer, ProtectedModelLoader, TfliteDeserializer, TfliteModel,
};
pub use protector::{
    CipherError, CipherSession, Direction, KeyMaterial, KeyMaterialError, SessionState,
    StreamCipherEngine,
};

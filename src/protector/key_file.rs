//! Opt-in persistence of key material for the encryption CLI.
//!
//! Key files are small JSON documents holding hex-encoded key and IV.
//! They are never written next to ciphertext automatically; the caller
//! chooses the path.

use serde::{Deserialize, Serialize};
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::key_material::{KeyMaterial, KeyMaterialError};

#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct KeyFile {
    key: String,
    iv: String,
}

/// Write key material to a new file at `path` with owner-only permissions.
///
/// Never replaces an existing file: an old key would be lost, and an
/// existing file would keep its own permissions.
pub fn write_key_file(path: &Path, material: &KeyMaterial) -> Result<(), KeyMaterialError> {
    let doc = KeyFile {
        key: hex::encode(material.key_bytes()),
        iv: hex::encode(material.iv_bytes()),
    };
    let json = Zeroizing::new(
        serde_json::to_string_pretty(&doc)
            .map_err(|e| KeyMaterialError::KeyFileFormat(e.to_string()))?,
    );

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(KeyMaterialError::KeyFileIo)?;
    }
    write_restricted(path, json.as_bytes())?;

    tracing::info!(path = %path.display(), "Key file written");
    Ok(())
}

/// Read key material previously written by [`write_key_file`].
pub fn read_key_file(path: &Path) -> Result<KeyMaterial, KeyMaterialError> {
    let raw = Zeroizing::new(std::fs::read_to_string(path).map_err(KeyMaterialError::KeyFileIo)?);
    let doc: KeyFile =
        serde_json::from_str(&raw).map_err(|e| KeyMaterialError::KeyFileFormat(e.to_string()))?;
    KeyMaterial::from_hex(&doc.key, &doc.iv)
}

/// Create key file with restrictive permissions (Unix).
#[cfg(unix)]
fn write_restricted(path: &Path, bytes: &[u8]) -> Result<(), KeyMaterialError> {
    use std::os::unix::fs::OpenOptionsExt;

    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .and_then(|mut file| std::io::Write::write_all(&mut file, bytes))
        .map_err(KeyMaterialError::KeyFileIo)
}

/// Create key file (non-Unix).
#[cfg(not(unix))]
fn write_restricted(path: &Path, bytes: &[u8]) -> Result<(), KeyMaterialError> {
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .and_then(|mut file| std::io::Write::write_all(&mut file, bytes))
        .map_err(KeyMaterialError::KeyFileIo)
}

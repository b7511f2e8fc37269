//! Tests for the protected model loader.

use super::*;
use crate::models::flatbuffer::{TfliteDeserializer, TFLITE_FILE_IDENTIFIER};
use crate::protector::CipherError;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(Debug, thiserror::Error)]
#[error("missing model magic")]
struct MissingMagic;

/// Accepts any buffer starting with `MDL` and returns an owned copy.
fn magic_loader() -> ProtectedModelLoader<impl ModelDeserializer<Model = Vec<u8>, Error = MissingMagic>> {
    ProtectedModelLoader::new(|bytes: &[u8]| {
        if bytes.starts_with(b"MDL") {
            Ok(bytes.to_vec())
        } else {
            Err(MissingMagic)
        }
    })
}

fn test_material() -> KeyMaterial {
    KeyMaterial::from_bytes(&[0x01; 32], &[0x02; 16]).unwrap()
}

fn write_encrypted(dir: &TempDir, name: &str, plaintext: &[u8], material: &KeyMaterial) -> PathBuf {
    let path = dir.path().join(name);
    let file = std::fs::File::create(&path).unwrap();
    StreamCipherEngine::new()
        .encrypt_stream(plaintext, file, material)
        .unwrap();
    path
}

#[test]
fn test_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let material = test_material();
    let plaintext = b"MDL model payload".to_vec();
    let path = write_encrypted(&dir, "a.enc", &plaintext, &material);

    let loader = magic_loader();
    let model = loader.load_encrypted(&path, &material).unwrap();
    assert_eq!(model, plaintext);
    assert_eq!(loader.buffered_len(), plaintext.len());
}

#[test]
fn test_sequential_loads_do_not_carry_over() {
    let dir = TempDir::new().unwrap();
    let material = test_material();
    let long = [b"MDL".as_slice(), &[0xEE; 5000]].concat();
    let short = b"MDL-short".to_vec();
    let long_path = write_encrypted(&dir, "long.enc", &long, &material);
    let short_path = write_encrypted(&dir, "short.enc", &short, &material);

    let loader = magic_loader();
    assert_eq!(loader.load_encrypted(&long_path, &material).unwrap(), long);

    let second = loader.load_encrypted(&short_path, &material).unwrap();
    assert_eq!(second, short);
    assert!(!second.contains(&0xEE));
    assert_eq!(loader.buffered_len(), short.len());
}

#[test]
fn test_parse_failure_retains_buffer() {
    let dir = TempDir::new().unwrap();
    let material = test_material();
    let plaintext = b"not a model".to_vec();
    let path = write_encrypted(&dir, "bad.enc", &plaintext, &material);

    let loader = magic_loader();
    let err = loader.load_encrypted(&path, &material).unwrap_err();
    assert!(err.is_parse_failure());
    assert!(err.to_string().contains("missing model magic"));
    assert_eq!(loader.buffered_len(), plaintext.len());
}

#[test]
fn test_decryption_failure_clears_buffer() {
    let dir = TempDir::new().unwrap();
    let material = test_material();
    let good = write_encrypted(&dir, "good.enc", b"MDL good", &material);
    let truncated = dir.path().join("truncated.enc");
    let bytes = std::fs::read(&good).unwrap();
    std::fs::write(&truncated, &bytes[..bytes.len() - 1]).unwrap();

    let loader = magic_loader();
    loader.load_encrypted(&good, &material).unwrap();
    assert!(loader.buffered_len() > 0);

    let err = loader.load_encrypted(&truncated, &material).unwrap_err();
    assert!(matches!(
        err,
        LoadError::DecryptionFailed(CipherError::MalformedCiphertext { .. })
    ));
    assert_eq!(loader.buffered_len(), 0);
}

#[test]
fn test_zero_length_file_fails_decryption() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.enc");
    std::fs::write(&path, b"").unwrap();

    let loader = magic_loader();
    let err = loader.load_encrypted(&path, &test_material()).unwrap_err();
    assert!(matches!(
        err,
        LoadError::DecryptionFailed(CipherError::MalformedCiphertext { len: 0 })
    ));
}

#[test]
fn test_missing_file_fails_decryption() {
    let dir = TempDir::new().unwrap();
    let loader = magic_loader();
    let err = loader
        .load_encrypted(dir.path().join("absent.enc"), &test_material())
        .unwrap_err();
    assert!(matches!(err, LoadError::DecryptionFailed(CipherError::IoRead(_))));
}

#[test]
fn test_try_load_reports_none_on_failure() {
    let dir = TempDir::new().unwrap();
    let material = test_material();
    let good = write_encrypted(&dir, "good.enc", b"MDL ok", &material);
    let bad = write_encrypted(&dir, "bad.enc", b"garbage", &material);

    let loader = magic_loader();
    assert_eq!(loader.try_load_encrypted(&good, &material), Some(b"MDL ok".to_vec()));
    assert_eq!(loader.try_load_encrypted(&bad, &material), None);
    assert_eq!(loader.try_load_encrypted(dir.path().join("absent"), &material), None);
}

#[test]
fn test_load_model_uses_deserializer_directly() {
    let loader = magic_loader();
    assert_eq!(loader.load_model(b"MDL raw").unwrap(), b"MDL raw".to_vec());
    assert!(loader.load_model(b"raw").unwrap_err().is_parse_failure());
    assert_eq!(loader.buffered_len(), 0);
}

#[test]
fn test_tflite_model_end_to_end() {
    let dir = TempDir::new().unwrap();
    let material = KeyMaterial::generate().unwrap();
    let mut flatbuffer = vec![0u8; 256];
    flatbuffer[..4].copy_from_slice(&16u32.to_le_bytes());
    flatbuffer[4..8].copy_from_slice(&TFLITE_FILE_IDENTIFIER);
    let path = write_encrypted(&dir, "detector.enc", &flatbuffer, &material);

    let loader = ProtectedModelLoader::new(TfliteDeserializer);
    let model = loader.load_encrypted(&path, &material).unwrap();
    assert_eq!(model.size_bytes(), 256);
    assert_eq!(model.root_offset(), 16);

    let wrong = KeyMaterial::generate().unwrap();
    assert!(loader.try_load_encrypted(&path, &wrong).is_none());
}

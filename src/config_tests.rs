//! Tests for runtime configuration loading.

use super::*;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = load_with(env(&[])).unwrap();
    assert_eq!(config.chunk_size, 4096);
    assert_eq!(config.encrypted_extension, "enc");
    assert!(!config.log_key_fingerprint);
    assert_eq!(config.log_format, LogFormat::Pretty);
}

#[test]
fn test_env_overrides() {
    let config = load_with(env(&[
        (ENV_CHUNK_SIZE, "65536"),
        (ENV_EXTENSION, "sealed"),
        (ENV_LOG_KEY_FINGERPRINT, "yes"),
        (ENV_LOG_FORMAT, "JSON"),
    ]))
    .unwrap();
    assert_eq!(config.chunk_size, 65536);
    assert_eq!(config.encrypted_extension, "sealed");
    assert!(config.log_key_fingerprint);
    assert_eq!(config.log_format, LogFormat::Json);
}

#[test]
fn test_toml_file_then_env() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "chunk_size = 1024\nencrypted_extension = \"bin\"\nlog_format = \"json\"").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let config = load_with(env(&[(ENV_CONFIG_PATH, path.as_str()), (ENV_CHUNK_SIZE, "2048")])).unwrap();
    assert_eq!(config.chunk_size, 2048);
    assert_eq!(config.encrypted_extension, "bin");
    assert_eq!(config.log_format, LogFormat::Json);
    assert!(!config.log_key_fingerprint);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = ProtectorConfig::from_toml_str("log_key_fingerprint = true").unwrap();
    assert!(config.log_key_fingerprint);
    assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
}

#[test]
fn test_invalid_values_rejected() {
    assert!(matches!(
        load_with(env(&[(ENV_CHUNK_SIZE, "8")])),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        load_with(env(&[(ENV_CHUNK_SIZE, "lots")])),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        load_with(env(&[(ENV_EXTENSION, "tar.enc")])),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        load_with(env(&[(ENV_LOG_FORMAT, "xml")])),
        Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
        load_with(env(&[(ENV_LOG_KEY_FINGERPRINT, "maybe")])),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_missing_or_malformed_file() {
    assert!(matches!(
        load_with(env(&[(ENV_CONFIG_PATH, "/nonexistent/model-protector.toml")])),
        Err(ConfigError::Io(_))
    ));

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "chunk_size = \"big\"").unwrap();
    let path = file.path().to_string_lossy().to_string();
    assert!(matches!(
        load_with(env(&[(ENV_CONFIG_PATH, path.as_str())])),
        Err(ConfigError::Parse(_))
    ));
}

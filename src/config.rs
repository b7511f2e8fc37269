//! Runtime configuration.
//!
//! Defaults, optionally overlaid by a TOML file named in
//! `MODEL_PROTECTOR_CONFIG`, then by individual environment variables.

use serde::Deserialize;
use std::path::Path;

use crate::protector::{BLOCK_SIZE, DEFAULT_CHUNK_SIZE};

pub const ENV_CONFIG_PATH: &str = "MODEL_PROTECTOR_CONFIG";
pub const ENV_CHUNK_SIZE: &str = "MODEL_PROTECTOR_CHUNK_SIZE";
pub const ENV_EXTENSION: &str = "MODEL_PROTECTOR_EXTENSION";
pub const ENV_LOG_KEY_FINGERPRINT: &str = "MODEL_PROTECTOR_LOG_KEY_FINGERPRINT";
pub const ENV_LOG_FORMAT: &str = "MODEL_PROTECTOR_LOG_FORMAT";

/// Largest accepted read chunk (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Log output format for the CLI subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid(format!("unknown log format '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProtectorConfig {
    /// Read chunk for stream encryption/decryption.
    pub chunk_size: usize,
    /// Extension given to encrypted model files.
    pub encrypted_extension: String,
    /// Emit a key fingerprint when key material is generated or assigned.
    pub log_key_fingerprint: bool,
    pub log_format: LogFormat,
}

impl Default for ProtectorConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            encrypted_extension: "enc".to_string(),
            log_key_fingerprint: false,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ProtectorConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_CHUNK_SIZE) {
            self.chunk_size = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{} must be an integer", ENV_CHUNK_SIZE)))?;
        }
        if let Some(v) = lookup(ENV_EXTENSION) {
            self.encrypted_extension = v.trim().to_string();
        }
        if let Some(v) = lookup(ENV_LOG_KEY_FINGERPRINT) {
            self.log_key_fingerprint = parse_bool(&v)
                .ok_or_else(|| ConfigError::Invalid(format!("{} must be a boolean", ENV_LOG_KEY_FINGERPRINT)))?;
        }
        if let Some(v) = lookup(ENV_LOG_FORMAT) {
            self.log_format = v.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size < BLOCK_SIZE || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::Invalid(format!(
                "chunk_size must be between {} and {}, got {}",
                BLOCK_SIZE, MAX_CHUNK_SIZE, self.chunk_size
            )));
        }
        let ext = &self.encrypted_extension;
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "encrypted_extension must be a bare extension, got '{}'",
                ext
            )));
        }
        Ok(())
    }
}

/// Load configuration from the process environment.
pub fn load() -> Result<ProtectorConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Load configuration using `lookup` in place of the process environment.
pub fn load_with<F>(lookup: F) -> Result<ProtectorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(ENV_CONFIG_PATH) {
        Some(path) => ProtectorConfig::from_file(Path::new(&path))?,
        None => ProtectorConfig::default(),
    };
    config.apply_env(&lookup)?;
    config.validate()?;
    Ok(config)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

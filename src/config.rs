// src/config.rs

//! Manages backend configuration: loading, defaults, and validation.

use crate::core::userpass::update::DEFAULT_MAX_WRITE_ATTEMPTS;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;

/// Which identity store implementation to use.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile, process-local storage.
    #[default]
    Memory,
    /// A JSON document on disk.
    File,
}

/// Configuration for the identity store.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Location of the users file. Only used by the `file` backend.
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> String {
    "userpass_data/users.json".to_string()
}

/// Settings for policy updates.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PolicyConfig {
    /// Read-modify-write cycles to attempt when concurrent writers keep winning.
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: default_max_write_attempts(),
        }
    }
}

fn default_max_write_attempts() -> usize {
    DEFAULT_MAX_WRITE_ATTEMPTS
}

/// A raw representation of the config file before validation.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    policies: PolicyConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Represents the final, validated configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub log_level: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub policies: PolicyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            storage: StorageConfig::default(),
            policies: PolicyConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config in '{path}'"))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw_config: RawConfig =
            toml::from_str(contents).context("Failed to parse TOML configuration")?;

        let config = Config {
            log_level: raw_config.log_level,
            storage: raw_config.storage,
            policies: raw_config.policies,
        };

        config.validate()?;
        Ok(config)
    }

    /// True when users live only in process memory and vanish on exit.
    pub fn is_ephemeral(&self) -> bool {
        self.storage.backend == StorageBackend::Memory
    }

    /// Validates the configuration to ensure logical consistency.
    fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            return Err(anyhow!("log_level cannot be empty"));
        }
        if self.storage.backend == StorageBackend::File && self.storage.path.trim().is_empty() {
            return Err(anyhow!(
                "storage.path cannot be empty when the file backend is selected"
            ));
        }
        if self.policies.max_write_attempts == 0 {
            return Err(anyhow!("policies.max_write_attempts cannot be 0"));
        }
        Ok(())
    }
}

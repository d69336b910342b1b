#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration for pacsmith
//!
//! Values are layered: built-in defaults, then `config.toml`, then
//! `PACSMITH_*` environment variables. The binary applies its flags last.

pub mod constants;
pub mod core;

pub use crate::core::{CheckerConfig, RemoteConfig, StorageConfig, ToolsConfig, UpstreamConfig};

use constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_CHECK, ENV_CHECK_INTERVAL, ENV_REPO_STORAGE,
    ENV_UPSTREAM_URL, REGISTRY_FILE_NAME,
};
use pacsmith_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub checker: CheckerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub remote: RemoteConfig,
}

impl Config {
    /// `~/.config/pacsmith/config.toml` on Linux
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoConfigDir` when the platform has none.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Read, parse and validate one TOML file
    ///
    /// Sections and keys left out keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable, is not valid TOML, or
    /// holds a value [`Config::validate`] rejects.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Unreadable {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::malformed(path.display().to_string(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the per-user file, or defaults when there is none
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load `path` when given (it must exist), else fall back to [`Config::load`]
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be loaded.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Apply `PACSMITH_*` overrides from the environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the variable whose value
    /// cannot be used.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Some(path) = env_override(ENV_REPO_STORAGE, |v| (!v.is_empty()).then(|| PathBuf::from(v)))? {
            self.storage.path = path;
        }
        if let Some(enabled) = env_override(ENV_CHECK, |v| match v {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        })? {
            self.checker.enabled = enabled;
        }
        if let Some(secs) = env_override(ENV_CHECK_INTERVAL, |v| v.parse::<u64>().ok().filter(|s| *s > 0))? {
            self.checker.interval_secs = secs;
        }
        if let Some(url) = env_override(ENV_UPSTREAM_URL, |v| {
            (v.starts_with("http://") || v.starts_with("https://")).then(|| v.to_string())
        })? {
            self.upstream.url = url;
        }
        Ok(())
    }

    /// Reject values that would make the checker or resolver spin
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), Error> {
        let zero = [
            ("checker.interval_secs", self.checker.interval_secs == 0),
            ("checker.sweep_secs", self.checker.sweep_secs == 0),
            ("upstream.batch_size", self.upstream.batch_size == 0),
        ];
        for (field, is_zero) in zero {
            if is_zero {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: "0".to_string(),
                }
                .into());
            }
        }
        if self.storage.default_archs.iter().any(|arch| arch.is_any()) {
            return Err(ConfigError::InvalidValue {
                field: "storage.default_archs".to_string(),
                value: "any".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Get the repository storage root
    #[must_use]
    pub fn storage_path(&self) -> &Path {
        &self.storage.path
    }

    /// Get the registry file path (with default)
    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        self.storage
            .registry
            .clone()
            .unwrap_or_else(|| self.storage.path.join(REGISTRY_FILE_NAME))
    }
}

/// Read `name` and convert it; unset gives `None`, unconvertible is an error
fn env_override<T>(name: &str, parse: impl FnOnce(&str) -> Option<T>) -> Result<Option<T>, Error> {
    let Ok(value) = std::env::var(name) else {
        return Ok(None);
    };
    match parse(&value) {
        Some(parsed) => Ok(Some(parsed)),
        None => Err(ConfigError::InvalidValue {
            field: name.to_string(),
            value,
        }
        .into()),
    }
}

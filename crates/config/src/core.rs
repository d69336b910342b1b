//! Configuration sections

use crate::constants::{DEFAULT_PKG_CONFIG_FILE, DEFAULT_STORAGE_PATH, DEFAULT_UPSTREAM_URL};
use pacsmith_types::Arch;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where repository databases and package files live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Architectures of repositories registered without an explicit list
    #[serde(default = "default_archs")]
    pub default_archs: Vec<Arch>,
    /// JSON file listing hosted repositories; `<path>/repos.json` when unset
    #[serde(default)]
    pub registry: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            default_archs: default_archs(),
            registry: None,
        }
    }
}

/// Background update checker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: u64,
    #[serde(default = "default_sweep_secs")]
    pub sweep_secs: u64,
}

impl CheckerConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    #[must_use]
    pub fn state_ttl(&self) -> Duration {
        Duration::from_secs(self.state_ttl_secs)
    }

    #[must_use]
    pub fn sweep(&self) -> Duration {
        Duration::from_secs(self.sweep_secs)
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval_secs(),
            cooldown_secs: default_cooldown_secs(),
            state_ttl_secs: default_state_ttl_secs(),
            sweep_secs: default_sweep_secs(),
        }
    }
}

/// Upstream metadata source (AUR RPC)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
    /// Maximum number of names per query
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl UpstreamConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout_secs: default_upstream_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

/// External database writer commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_repo_add")]
    pub repo_add: PathBuf,
    #[serde(default = "default_repo_remove")]
    pub repo_remove: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            repo_add: default_repo_add(),
            repo_remove: default_repo_remove(),
        }
    }
}

/// Source hosting collaborator: package config fetch and build trigger
///
/// `config_url` is a template expanded with `{owner}`, `{repo}`, `{branch}`
/// and `{file}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub config_url: Option<String>,
    #[serde(default)]
    pub trigger_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_pkg_config_file")]
    pub config_file: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            config_url: None,
            trigger_url: None,
            token: None,
            config_file: default_pkg_config_file(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_PATH)
}

fn default_archs() -> Vec<Arch> {
    vec![Arch::X86_64]
}

fn default_interval_secs() -> u64 {
    600 // 10 minutes
}

fn default_cooldown_secs() -> u64 {
    3600 // 1 hour
}

fn default_state_ttl_secs() -> u64 {
    7200 // 2 hours
}

fn default_sweep_secs() -> u64 {
    600
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_batch_size() -> usize {
    100
}

fn default_repo_add() -> PathBuf {
    PathBuf::from("repo-add")
}

fn default_repo_remove() -> PathBuf {
    PathBuf::from("repo-remove")
}

fn default_pkg_config_file() -> String {
    DEFAULT_PKG_CONFIG_FILE.to_string()
}

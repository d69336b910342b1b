//! Fixed names and environment variables used by pacsmith

/// Directory under the platform config dir holding `config.toml`
pub const CONFIG_DIR_NAME: &str = "pacsmith";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_STORAGE_PATH: &str = "./_repo_storage";
pub const REGISTRY_FILE_NAME: &str = "repos.json";

pub const DEFAULT_UPSTREAM_URL: &str = "https://aur.archlinux.org/rpc/";
pub const DEFAULT_PKG_CONFIG_FILE: &str = "packages.yml";

pub const ENV_REPO_STORAGE: &str = "PACSMITH_REPO_STORAGE";
pub const ENV_CHECK: &str = "PACSMITH_CHECK";
pub const ENV_CHECK_INTERVAL: &str = "PACSMITH_CHECK_INTERVAL";
pub const ENV_UPSTREAM_URL: &str = "PACSMITH_UPSTREAM_URL";

//! Hosted repository identity and tracked-package configuration

use crate::package::is_valid_name;
use crate::Arch;
use chrono::{DateTime, Utc};
use pacsmith_errors::{ConfigError, PackageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Validate a repository name
///
/// # Errors
///
/// Returns `PackageError::InvalidRepositoryName` unless the name matches
/// `[a-z0-9@._+][a-z0-9@._+-]*`.
pub fn validate_repo_name(name: &str) -> Result<(), PackageError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(PackageError::InvalidRepositoryName {
            name: name.to_string(),
        })
    }
}

/// Identity of a hosted repository, written `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoKey {
    pub owner: String,
    pub name: String,
}

impl RepoKey {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoKey {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PackageError::InvalidRepositoryName {
            name: s.to_string(),
        };
        let (owner, name) = s.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || owner.contains('/') {
            return Err(invalid());
        }
        validate_repo_name(name)?;
        Ok(Self::new(owner, name))
    }
}

/// A hosted repository as registered by its owner
///
/// `source_*` locate the git repository holding the package sources and the
/// tracked-package configuration; `build_branch` is where build requests land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRecord {
    pub owner: String,
    pub name: String,
    #[serde(default)]
    pub archs: Vec<Arch>,
    #[serde(default)]
    pub private: bool,
    pub source_owner: String,
    pub source_name: String,
    pub source_branch: String,
    pub build_branch: String,
    #[serde(default)]
    pub last_check: Option<DateTime<Utc>>,
}

impl RepoRecord {
    #[must_use]
    pub fn key(&self) -> RepoKey {
        RepoKey::new(&self.owner, &self.name)
    }

    /// Identity of the source repository, `source_owner/source_name`
    #[must_use]
    pub fn source_key(&self) -> RepoKey {
        RepoKey::new(&self.source_owner, &self.source_name)
    }

    /// When the cooldown since the last check elapses, `None` if never checked
    ///
    /// A cooldown reaching past the representable range saturates.
    #[must_use]
    pub fn next_check(&self, cooldown: chrono::Duration) -> Option<DateTime<Utc>> {
        self.last_check
            .map(|last| last.checked_add_signed(cooldown).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// Whether the cooldown since the last check has elapsed at `now`
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>, cooldown: chrono::Duration) -> bool {
        self.next_check(cooldown).is_none_or(|due| due <= now)
    }
}

/// Packages tracked by a repository, read from `packages.yml`
///
/// ```yaml
/// aur:
///   - neovim-git
///   - ca-certificates
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgConfig {
    #[serde(default)]
    pub aur: Vec<String>,
}

impl PkgConfig {
    /// Parse a YAML document
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Malformed` if the document is not valid YAML
    /// or does not match the expected shape.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(content).map_err(|e| ConfigError::malformed("packages.yml", e))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aur.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_key_parse() {
        let key: RepoKey = "mikkeloscar/aur".parse().unwrap();
        assert_eq!(key.owner, "mikkeloscar");
        assert_eq!(key.name, "aur");
        assert_eq!(key.to_string(), "mikkeloscar/aur");

        assert!("noslash".parse::<RepoKey>().is_err());
        assert!("a/b/c".parse::<RepoKey>().is_err());
        assert!("/aur".parse::<RepoKey>().is_err());
        assert!("owner/-bad".parse::<RepoKey>().is_err());
    }

    #[test]
    fn test_validate_repo_name() {
        assert!(validate_repo_name("my-repo.x86").is_ok());
        assert!(matches!(
            validate_repo_name("My Repo"),
            Err(PackageError::InvalidRepositoryName { .. })
        ));
    }

    #[test]
    fn test_pkg_config_yaml() {
        let config = PkgConfig::from_yaml("aur:\n  - neovim-git\n  - ca-certificates\n").unwrap();
        assert_eq!(config.aur, vec!["neovim-git", "ca-certificates"]);

        assert!(PkgConfig::from_yaml("").unwrap().is_empty());
        assert!(PkgConfig::from_yaml("aur: [unterminated").is_err());
    }

    #[test]
    fn test_repo_due() {
        let now = Utc::now();
        let mut record = RepoRecord {
            owner: "o".into(),
            name: "r".into(),
            archs: vec![Arch::X86_64],
            private: false,
            source_owner: "o".into(),
            source_name: "r-src".into(),
            source_branch: "master".into(),
            build_branch: "build".into(),
            last_check: None,
        };
        let cooldown = chrono::Duration::hours(1);
        assert!(record.is_due(now, cooldown));

        record.last_check = Some(now - chrono::Duration::minutes(10));
        assert!(!record.is_due(now, cooldown));

        record.last_check = Some(now - chrono::Duration::hours(2));
        assert!(record.is_due(now, cooldown));
    }

    #[test]
    fn test_cooldown_past_the_calendar_is_never_due() {
        let now = Utc::now();
        let mut record = RepoRecord {
            owner: "o".into(),
            name: "r".into(),
            archs: vec![Arch::X86_64],
            private: false,
            source_owner: "o".into(),
            source_name: "r".into(),
            source_branch: "master".into(),
            build_branch: "build".into(),
            last_check: Some(now),
        };

        let cooldown = chrono::Duration::seconds(10_000_000_000_000);
        assert!(!record.is_due(now, cooldown));
        assert_eq!(record.next_check(cooldown), Some(DateTime::<Utc>::MAX_UTC));
        assert!(!record.is_due(now, chrono::Duration::MAX));

        record.last_check = None;
        assert!(record.is_due(now, chrono::Duration::MAX));
        assert_eq!(record.next_check(cooldown), None);
    }
}

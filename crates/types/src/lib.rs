#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for pacsmith
//!
//! This crate provides the fundamental types shared by the repository engine,
//! the dependency resolver and the checker: version ordering, package records,
//! package filenames and repository identity.

pub mod package;
pub mod repo;
pub mod version;

pub use package::{is_devel, split_name_version, DepSpec, Package, PackageFilename};
pub use repo::{validate_repo_name, PkgConfig, RepoKey, RepoRecord};
pub use version::{compare, vercmp, Version};

use pacsmith_errors::PackageError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Target architecture of a package or a hosted database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    #[serde(rename = "x86_64")]
    X86_64,
    I686,
    Aarch64,
    Armv7h,
    /// Architecture-independent, applies to every architecture of a repository
    Any,
}

impl Arch {
    /// Every concrete architecture a repository may host
    pub const CONCRETE: [Arch; 4] = [Arch::X86_64, Arch::I686, Arch::Aarch64, Arch::Armv7h];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::I686 => "i686",
            Self::Aarch64 => "aarch64",
            Self::Armv7h => "armv7h",
            Self::Any => "any",
        }
    }

    #[must_use]
    pub fn is_any(self) -> bool {
        self == Self::Any
    }
}

impl FromStr for Arch {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" => Ok(Self::X86_64),
            "i686" => Ok(Self::I686),
            "aarch64" => Ok(Self::Aarch64),
            "armv7h" => Ok(Self::Armv7h),
            "any" => Ok(Self::Any),
            other => Err(PackageError::InvalidArch {
                arch: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl clap::ValueEnum for Arch {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::X86_64, Self::I686, Self::Aarch64, Self::Armv7h, Self::Any]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arch_round_trip() {
        for arch in [Arch::X86_64, Arch::I686, Arch::Aarch64, Arch::Armv7h, Arch::Any] {
            assert_eq!(arch.as_str().parse::<Arch>().unwrap(), arch);
        }
        assert!("arm64".parse::<Arch>().is_err());
    }

    #[test]
    fn test_arch_serde_names() {
        let json = serde_json::to_string(&Arch::X86_64).unwrap();
        assert_eq!(json, "\"x86_64\"");
        let arch: Arch = serde_json::from_str("\"armv7h\"").unwrap();
        assert_eq!(arch, Arch::Armv7h);
    }
}

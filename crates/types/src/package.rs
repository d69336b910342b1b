//! Package records, package filenames and dependency specifiers

use crate::{Arch, Version};
use chrono::{DateTime, Utc};
use pacsmith_errors::{PackageError, VersionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PACKAGE_EXTENSIONS: [&str; 2] = [".pkg.tar.xz", ".pkg.tar.zst"];
const SIGNATURE_EXTENSION: &str = ".sig";
const DEVEL_SUFFIXES: [&str; 4] = ["-git", "-svn", "-hg", "-bzr"];

/// One entry of a repository database
///
/// A read-only projection of the `desc` (and optionally `files`) blocks of an
/// archive entry. `files` is only populated when the listing was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub filename: String,
    pub name: String,
    pub base: String,
    pub version: String,
    #[serde(rename = "desc")]
    pub description: String,
    pub groups: Vec<String>,
    pub csize: String,
    pub isize: String,
    pub md5sum: String,
    pub sha256sum: String,
    pub pgpsig: String,
    pub url: String,
    pub license: String,
    pub arch: String,
    pub build_date: Option<DateTime<Utc>>,
    pub packager: String,
    pub replaces: Vec<String>,
    pub conflicts: Vec<String>,
    pub provides: Vec<String>,
    pub depends: Vec<String>,
    pub optdepends: Vec<String>,
    pub makedepends: Vec<String>,
    pub checkdepends: Vec<String>,
    pub files: Vec<String>,
}

impl Package {
    /// Parsed version of this record
    ///
    /// # Errors
    ///
    /// Returns an error if the recorded version is malformed.
    pub fn parsed_version(&self) -> Result<Version, VersionError> {
        Version::parse(&self.version)
    }

    /// Bare names of the runtime dependencies
    pub fn depends_names(&self) -> impl Iterator<Item = &str> {
        self.depends.iter().map(|spec| DepSpec::bare_name(spec))
    }
}

/// Whether a package tracks a moving VCS reference (`-git`, `-svn`, `-hg`, `-bzr`)
#[must_use]
pub fn is_devel(name: &str) -> bool {
    DEVEL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Validate a package or repository name: `[a-z0-9@._+][a-z0-9@._+-]*`
pub(crate) fn is_valid_name(name: &str) -> bool {
    let allowed = |c: char| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '@' | '.' | '_' | '+')
    };
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if allowed(first) => chars.all(|c| allowed(c) || c == '-'),
        _ => false,
    }
}

/// Components of a package filename `<name>-<version>-<arch>.pkg.tar.xz[.sig]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageFilename {
    pub name: String,
    pub version: String,
    pub arch: Arch,
}

impl PackageFilename {
    /// Parse a package filename, anchoring from the right
    ///
    /// The extension and architecture are stripped first, then the last two
    /// hyphen-separated segments are taken as `pkgver-pkgrel`.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidFilename` if the filename does not follow
    /// the package naming convention.
    pub fn parse(filename: &str) -> Result<Self, PackageError> {
        let invalid = || PackageError::InvalidFilename {
            filename: filename.to_string(),
        };

        let stem = filename
            .strip_suffix(SIGNATURE_EXTENSION)
            .unwrap_or(filename);
        let stem = PACKAGE_EXTENSIONS
            .iter()
            .find_map(|ext| stem.strip_suffix(ext))
            .ok_or_else(invalid)?;

        let (name_version, arch) = stem.rsplit_once('-').ok_or_else(invalid)?;
        let arch: Arch = arch.parse().map_err(|_| invalid())?;

        let (name, version) = split_name_version(name_version).ok_or_else(invalid)?;
        if !is_valid_name(name) || Version::parse(version).is_err() {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            arch,
        })
    }

    /// `<name>-<version>`, the directory name of the package's database entry
    #[must_use]
    pub fn entry_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Parsed version
    ///
    /// # Errors
    ///
    /// Returns an error if the version is malformed; never the case for
    /// values produced by [`PackageFilename::parse`].
    pub fn parsed_version(&self) -> Result<Version, VersionError> {
        Version::parse(&self.version)
    }
}

impl FromStr for PackageFilename {
    type Err = PackageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split a database entry name (`zlib-1.2.8-4` or `zlib-1.2.8-4/`) into name and version
#[must_use]
pub fn split_name_version(entry: &str) -> Option<(&str, &str)> {
    let entry = entry.strip_suffix('/').unwrap_or(entry);
    let mut parts = entry.rsplitn(3, '-');
    let pkgrel = parts.next()?;
    let pkgver = parts.next()?;
    let name = parts.next()?;
    if name.is_empty() || pkgver.is_empty() || pkgrel.is_empty() {
        return None;
    }
    let version_start = name.len() + 1;
    Some((name, &entry[version_start..]))
}

/// Comparison operator of a versioned dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
}

impl fmt::Display for DepOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
            Self::Ge => ">=",
            Self::Gt => ">",
        };
        f.write_str(op)
    }
}

/// A raw dependency specifier such as `glibc>=2.20`, `sh` or `python: for scripts`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepSpec {
    pub name: String,
    pub constraint: Option<(DepOp, String)>,
    pub description: Option<String>,
}

impl DepSpec {
    /// Parse a dependency specifier
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidDependency` if the name is empty or a
    /// comparison operator has no version.
    pub fn parse(spec: &str) -> Result<Self, PackageError> {
        let invalid = || PackageError::InvalidDependency {
            spec: spec.to_string(),
        };

        let (head, description) = match spec.split_once(':') {
            // optdepends use `name: description`; epochs never follow an operator-less name
            Some((head, desc)) if !head.contains(['<', '>', '=']) => {
                (head, Some(desc.trim().to_string()).filter(|d| !d.is_empty()))
            }
            _ => (spec, None),
        };
        let head = head.trim();

        let name = Self::bare_name(head);
        if name.is_empty() {
            return Err(invalid());
        }

        let rest = &head[name.len()..];
        let constraint = if rest.is_empty() {
            None
        } else {
            let (op, version) = if let Some(v) = rest.strip_prefix(">=") {
                (DepOp::Ge, v)
            } else if let Some(v) = rest.strip_prefix("<=") {
                (DepOp::Le, v)
            } else if let Some(v) = rest.strip_prefix('>') {
                (DepOp::Gt, v)
            } else if let Some(v) = rest.strip_prefix('<') {
                (DepOp::Lt, v)
            } else if let Some(v) = rest.strip_prefix('=') {
                (DepOp::Eq, v)
            } else {
                return Err(invalid());
            };
            if version.is_empty() {
                return Err(invalid());
            }
            Some((op, version.to_string()))
        };

        Ok(Self {
            name: name.to_string(),
            constraint,
            description,
        })
    }

    /// Name part of a specifier, up to the first operator or colon
    #[must_use]
    pub fn bare_name(spec: &str) -> &str {
        let end = spec.find(['<', '>', '=', ':']).unwrap_or(spec.len());
        spec[..end].trim()
    }
}

impl fmt::Display for DepSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some((op, version)) = &self.constraint {
            write!(f, "{op}{version}")?;
        }
        if let Some(desc) = &self.description {
            write!(f, ": {desc}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filename_any() {
        let parsed = PackageFilename::parse("ca-certificates-20150402-1-any.pkg.tar.xz").unwrap();
        assert_eq!(parsed.name, "ca-certificates");
        assert_eq!(parsed.version, "20150402-1");
        assert_eq!(parsed.arch, Arch::Any);
        assert_eq!(parsed.entry_name(), "ca-certificates-20150402-1");
    }

    #[test]
    fn test_parse_filename_hyphenated_name() {
        let parsed = PackageFilename::parse("pulseaudio-raop2-8.0-1-x86_64.pkg.tar.xz").unwrap();
        assert_eq!(parsed.name, "pulseaudio-raop2");
        assert_eq!(parsed.version, "8.0-1");
        assert_eq!(parsed.arch, Arch::X86_64);
    }

    #[test]
    fn test_parse_filename_signature_and_zstd() {
        let parsed = PackageFilename::parse("zlib-1:1.2.8-4-i686.pkg.tar.zst.sig").unwrap();
        assert_eq!(parsed.name, "zlib");
        assert_eq!(parsed.version, "1:1.2.8-4");
        assert_eq!(parsed.arch, Arch::I686);
    }

    #[test]
    fn test_parse_filename_rejects_malformed() {
        for bad in [
            "zlib-1.2.8-any.pkg.tar.xz",
            "zlib-1.2.8-4-any.tar.gz",
            "zlib-1.2.8-4-sparc.pkg.tar.xz",
            "Zlib-1.2.8-4-any.pkg.tar.xz",
            "-1.2.8-4-any.pkg.tar.xz",
            "zlib-1.2.8-x-any.pkg.tar.xz",
            ".pkg.tar.xz",
        ] {
            let err = PackageFilename::parse(bad).unwrap_err();
            assert!(
                matches!(err, PackageError::InvalidFilename { .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_split_name_version() {
        assert_eq!(split_name_version("zlib-1.2.8-4/"), Some(("zlib", "1.2.8-4")));
        assert_eq!(
            split_name_version("lib32-gcc-libs-5.2.0-2"),
            Some(("lib32-gcc-libs", "5.2.0-2"))
        );
        assert_eq!(split_name_version("zlib-1.2.8"), None);
        assert_eq!(split_name_version("zlib"), None);
    }

    #[test]
    fn test_is_devel() {
        assert!(is_devel("neovim-git"));
        assert!(is_devel("foo-svn"));
        assert!(is_devel("foo-hg"));
        assert!(is_devel("foo-bzr"));
        assert!(!is_devel("git"));
        assert!(!is_devel("gitg"));
        assert!(!is_devel("foo-github"));
    }

    #[test]
    fn test_dep_spec() {
        let dep = DepSpec::parse("glibc>=2.20").unwrap();
        assert_eq!(dep.name, "glibc");
        assert_eq!(dep.constraint, Some((DepOp::Ge, "2.20".to_string())));
        assert_eq!(dep.to_string(), "glibc>=2.20");

        let dep = DepSpec::parse("python: for the helper scripts").unwrap();
        assert_eq!(dep.name, "python");
        assert_eq!(dep.constraint, None);
        assert_eq!(dep.description.as_deref(), Some("for the helper scripts"));

        let dep = DepSpec::parse("sh").unwrap();
        assert_eq!(dep.name, "sh");
        assert!(dep.constraint.is_none());

        assert!(DepSpec::parse(">=1.0").is_err());
        assert!(DepSpec::parse("foo>=").is_err());
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(DepSpec::bare_name("java-runtime=8"), "java-runtime");
        assert_eq!(DepSpec::bare_name("libfoo.so<3"), "libfoo.so");
        assert_eq!(DepSpec::bare_name("perl: scripts"), "perl");
        assert_eq!(DepSpec::bare_name("bash"), "bash");
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("ca-certificates"));
        assert!(is_valid_name("lib32+extra_1.0@x"));
        assert!(!is_valid_name("-leading"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Upper"));
        assert!(!is_valid_name("sp ace"));
    }
}

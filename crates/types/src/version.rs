//! Package version ordering
//!
//! Versions have the shape `[epoch:]pkgver-pkgrel`:
//! - `epoch` is numeric and defaults to `0`; it is compared first
//! - `pkgver` is split into alternating numeric and alphabetic runs which are
//!   compared run by run, numerically or lexically; any other character only
//!   separates runs, except `~` which sorts below everything (pre-releases)
//! - when one side runs out, a leftover numeric run is newer (`1.0.1 > 1.0`)
//!   and a leftover alphabetic run is older (`1.0rc1 < 1.0`)
//! - `pkgrel` is compared last, with the same run rules

use pacsmith_errors::VersionError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed `[epoch:]pkgver-pkgrel` version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    epoch: Option<u64>,
    pkgver: String,
    pkgrel: String,
}

impl Version {
    /// Parse a version string
    ///
    /// # Errors
    ///
    /// Returns `VersionError::InvalidVersion` if the epoch or release is not
    /// numeric, the release is missing, or `pkgver` is empty.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let invalid = |reason: &str| VersionError::InvalidVersion {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (epoch, rest) = match input.split_once(':') {
            Some((epoch, rest)) => {
                if epoch.is_empty() || !epoch.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid("epoch is not numeric"));
                }
                let epoch = epoch.parse().map_err(|_| invalid("epoch out of range"))?;
                (Some(epoch), rest)
            }
            None => (None, input),
        };

        let (pkgver, pkgrel) = rest
            .rsplit_once('-')
            .ok_or_else(|| invalid("missing pkgrel"))?;

        if pkgver.is_empty() {
            return Err(invalid("empty pkgver"));
        }
        if pkgver
            .chars()
            .any(|c| c == ':' || c == '/' || c.is_whitespace())
        {
            return Err(invalid("pkgver contains a forbidden character"));
        }
        if !is_valid_pkgrel(pkgrel) {
            return Err(invalid("pkgrel is not numeric"));
        }

        Ok(Self {
            epoch,
            pkgver: pkgver.to_string(),
            pkgrel: pkgrel.to_string(),
        })
    }

    /// Epoch, defaulting to zero when absent
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.unwrap_or(0)
    }

    #[must_use]
    pub fn pkgver(&self) -> &str {
        &self.pkgver
    }

    #[must_use]
    pub fn pkgrel(&self) -> &str {
        &self.pkgrel
    }

    /// Whether `self` sorts strictly after `other`
    #[must_use]
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self > other
    }
}

// pkgrel is `N` or `N.M`
fn is_valid_pkgrel(rel: &str) -> bool {
    let mut parts = rel.splitn(2, '.');
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match (parts.next(), parts.next()) {
        (Some(major), None) => all_digits(major),
        (Some(major), Some(minor)) => all_digits(major) && all_digits(minor),
        _ => false,
    }
}

/// Compare two full version strings
///
/// # Errors
///
/// Returns `VersionError::InvalidVersion` if either side fails to parse.
pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionError> {
    Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
}

/// Compare two version fragments (a `pkgver` or a `pkgrel`) run by run
#[must_use]
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut one = a.as_bytes();
    let mut two = b.as_bytes();

    loop {
        one = skip_separators(one);
        two = skip_separators(two);

        match (one.first() == Some(&b'~'), two.first() == Some(&b'~')) {
            (true, true) => {
                one = &one[1..];
                two = &two[1..];
                continue;
            }
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        if one.is_empty() || two.is_empty() {
            break;
        }

        let numeric = one[0].is_ascii_digit();
        let (seg1, rest1) = take_run(one, numeric);
        let (seg2, rest2) = take_run(two, numeric);

        // runs of different kinds: numeric is newer
        if seg2.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ord = if numeric {
            compare_numeric(seg1, seg2)
        } else {
            seg1.cmp(seg2)
        };
        if ord != Ordering::Equal {
            return ord;
        }

        one = rest1;
        two = rest2;
    }

    // a leftover numeric run is newer, a leftover alphabetic run is older
    let alpha = |s: &[u8]| s.first().is_some_and(u8::is_ascii_alphabetic);
    if one.is_empty() && two.is_empty() {
        Ordering::Equal
    } else if (one.is_empty() && !alpha(two)) || alpha(one) {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

fn skip_separators(s: &[u8]) -> &[u8] {
    let start = s
        .iter()
        .position(|b| b.is_ascii_alphanumeric() || *b == b'~')
        .unwrap_or(s.len());
    &s[start..]
}

fn take_run(s: &[u8], numeric: bool) -> (&[u8], &[u8]) {
    let end = s
        .iter()
        .position(|b| {
            if numeric {
                !b.is_ascii_digit()
            } else {
                !b.is_ascii_alphabetic()
            }
        })
        .unwrap_or(s.len());
    s.split_at(end)
}

fn compare_numeric(a: &[u8], b: &[u8]) -> Ordering {
    let strip = |s: &[u8]| -> usize { s.iter().position(|b| *b != b'0').unwrap_or(s.len()) };
    let a = &a[strip(a)..];
    let b = &b[strip(b)..];
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch()
            .cmp(&other.epoch())
            .then_with(|| vercmp(&self.pkgver, &other.pkgver))
            .then_with(|| vercmp(&self.pkgrel, &other.pkgrel))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(epoch) = self.epoch {
            write!(f, "{epoch}:")?;
        }
        write!(f, "{}-{}", self.pkgver, self.pkgrel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_components() {
        let version = v("2:20150402-1");
        assert_eq!(version.epoch(), 2);
        assert_eq!(version.pkgver(), "20150402");
        assert_eq!(version.pkgrel(), "1");
        assert_eq!(version.to_string(), "2:20150402-1");

        let version = v("1.2.8-4");
        assert_eq!(version.epoch(), 0);
        assert_eq!(version.to_string(), "1.2.8-4");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Version::parse("1.2.8").is_err());
        assert!(Version::parse("-1").is_err());
        assert!(Version::parse("x:1.0-1").is_err());
        assert!(Version::parse(":1.0-1").is_err());
        assert!(Version::parse("1.0-rc").is_err());
        assert!(Version::parse("1.0-1.").is_err());
        assert!(Version::parse("1.0-").is_err());
    }

    #[test]
    fn test_pkgrel_with_minor() {
        assert!(v("1.0-1.1") > v("1.0-1"));
        assert!(v("1.0-2") > v("1.0-1.1"));
    }

    #[test]
    fn test_epoch_wins() {
        assert!(v("1:1.0-1") > v("9.9-9"));
        assert_eq!(v("0:1.0-1"), v("1.0-1"));
    }

    #[test]
    fn test_vercmp_runs() {
        assert_eq!(vercmp("1.0", "1.0"), Ordering::Equal);
        assert_eq!(vercmp("1.10", "1.9"), Ordering::Greater);
        assert_eq!(vercmp("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(vercmp("1.0a", "1.0b"), Ordering::Less);
        assert_eq!(vercmp("1.001", "1.1"), Ordering::Equal);
        assert_eq!(vercmp("1.a", "1.1"), Ordering::Less);
        assert_eq!(vercmp("20150402", "20150401"), Ordering::Greater);
    }

    #[test]
    fn test_alpha_tail_sorts_before_release() {
        assert_eq!(vercmp("1.0rc1", "1.0"), Ordering::Less);
        assert_eq!(vercmp("1.0a", "1.0"), Ordering::Less);
        assert_eq!(vercmp("1.0", "1.0.a"), Ordering::Greater);
        assert_eq!(vercmp("1.0.a", "1.0"), Ordering::Less);
        assert_eq!(vercmp("1.0", "1.0rc1"), Ordering::Greater);
        assert!(Version::parse("1.0beta-1").unwrap() < Version::parse("1.0-1").unwrap());
    }

    #[test]
    fn test_tilde_sorts_first() {
        assert_eq!(vercmp("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(vercmp("1.0~rc1", "1.0~rc2"), Ordering::Less);
        assert_eq!(vercmp("1.0~~", "1.0~"), Ordering::Less);
        assert_eq!(vercmp("1.0", "1.0~rc1"), Ordering::Greater);
    }

    #[test]
    fn test_compare_strings() {
        assert_eq!(compare("20150402-2", "20150402-1").unwrap(), Ordering::Greater);
        assert_eq!(compare("20150401-1", "20150402-1").unwrap(), Ordering::Less);
        assert!(compare("abc", "1.0-1").is_err());
    }
}

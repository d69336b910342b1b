//! Parser for the `desc`, `depends` and `files` blocks of a database entry
//!
//! A block is line oriented. `%FIELD%` selects the field the following lines
//! belong to, a blank line deselects it. Scalar fields keep the last value,
//! list fields collect every value in order.

use chrono::DateTime;
use pacsmith_errors::PackageError;
use pacsmith_types::Package;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    Filename,
    Name,
    Base,
    Version,
    Desc,
    CSize,
    ISize,
    Md5Sum,
    Sha256Sum,
    PgpSig,
    Url,
    License,
    Arch,
    Packager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum List {
    Groups,
    Replaces,
    Conflicts,
    Provides,
    Depends,
    OptDepends,
    MakeDepends,
    CheckDepends,
    Files,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Scalar(Scalar),
    List(List),
    BuildDate,
}

impl Field {
    fn from_marker(marker: &str) -> Option<Self> {
        let field = match marker {
            "FILENAME" => Self::Scalar(Scalar::Filename),
            "NAME" => Self::Scalar(Scalar::Name),
            "BASE" => Self::Scalar(Scalar::Base),
            "VERSION" => Self::Scalar(Scalar::Version),
            "DESC" => Self::Scalar(Scalar::Desc),
            "CSIZE" => Self::Scalar(Scalar::CSize),
            "ISIZE" => Self::Scalar(Scalar::ISize),
            "MD5SUM" => Self::Scalar(Scalar::Md5Sum),
            "SHA256SUM" => Self::Scalar(Scalar::Sha256Sum),
            "PGPSIG" => Self::Scalar(Scalar::PgpSig),
            "URL" => Self::Scalar(Scalar::Url),
            "LICENSE" => Self::Scalar(Scalar::License),
            "ARCH" => Self::Scalar(Scalar::Arch),
            "PACKAGER" => Self::Scalar(Scalar::Packager),
            "BUILDDATE" => Self::BuildDate,
            "GROUPS" => Self::List(List::Groups),
            "REPLACES" => Self::List(List::Replaces),
            "CONFLICTS" => Self::List(List::Conflicts),
            "PROVIDES" => Self::List(List::Provides),
            "DEPENDS" => Self::List(List::Depends),
            "OPTDEPENDS" => Self::List(List::OptDepends),
            "MAKEDEPENDS" => Self::List(List::MakeDepends),
            "CHECKDEPENDS" => Self::List(List::CheckDepends),
            "FILES" => Self::List(List::Files),
            _ => return None,
        };
        Some(field)
    }
}

fn scalar_mut(pkg: &mut Package, field: Scalar) -> &mut String {
    match field {
        Scalar::Filename => &mut pkg.filename,
        Scalar::Name => &mut pkg.name,
        Scalar::Base => &mut pkg.base,
        Scalar::Version => &mut pkg.version,
        Scalar::Desc => &mut pkg.description,
        Scalar::CSize => &mut pkg.csize,
        Scalar::ISize => &mut pkg.isize,
        Scalar::Md5Sum => &mut pkg.md5sum,
        Scalar::Sha256Sum => &mut pkg.sha256sum,
        Scalar::PgpSig => &mut pkg.pgpsig,
        Scalar::Url => &mut pkg.url,
        Scalar::License => &mut pkg.license,
        Scalar::Arch => &mut pkg.arch,
        Scalar::Packager => &mut pkg.packager,
    }
}

fn list_mut(pkg: &mut Package, field: List) -> &mut Vec<String> {
    match field {
        List::Groups => &mut pkg.groups,
        List::Replaces => &mut pkg.replaces,
        List::Conflicts => &mut pkg.conflicts,
        List::Provides => &mut pkg.provides,
        List::Depends => &mut pkg.depends,
        List::OptDepends => &mut pkg.optdepends,
        List::MakeDepends => &mut pkg.makedepends,
        List::CheckDepends => &mut pkg.checkdepends,
        List::Files => &mut pkg.files,
    }
}

fn marker(line: &str) -> Option<&str> {
    line.strip_prefix('%')?.strip_suffix('%')
}

fn parse_block(content: &str, pkg: &mut Package, initial: Option<Field>) -> Result<(), PackageError> {
    let mut current = initial;

    for line in content.lines() {
        if line.is_empty() {
            current = None;
            continue;
        }
        if let Some(name) = marker(line) {
            current = Field::from_marker(name);
            continue;
        }

        match current {
            Some(Field::Scalar(field)) => *scalar_mut(pkg, field) = line.to_string(),
            Some(Field::List(field)) => list_mut(pkg, field).push(line.to_string()),
            Some(Field::BuildDate) => {
                let secs: i64 = line.trim().parse().map_err(|_| PackageError::InvalidRecord {
                    message: format!("invalid build date: {line}"),
                })?;
                pkg.build_date = Some(DateTime::from_timestamp(secs, 0).ok_or_else(|| {
                    PackageError::InvalidRecord {
                        message: format!("build date out of range: {secs}"),
                    }
                })?);
            }
            None => {}
        }
    }

    Ok(())
}

/// Merge a `desc` (or legacy `depends`) block into `pkg`
///
/// # Errors
///
/// Returns `PackageError::InvalidRecord` if the build date is not a Unix
/// timestamp.
pub fn parse_desc(content: &str, pkg: &mut Package) -> Result<(), PackageError> {
    parse_block(content, pkg, None)
}

/// Merge a `files` block into `pkg`
///
/// The `%FILES%` marker is optional: lines before any marker are taken as
/// paths.
///
/// # Errors
///
/// Returns `PackageError::InvalidRecord` on a malformed build date, which a
/// well-formed files block never contains.
pub fn parse_files(content: &str, pkg: &mut Package) -> Result<(), PackageError> {
    parse_block(content, pkg, Some(Field::List(List::Files)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESC: &str = "%FILENAME%
ca-certificates-20150402-1-any.pkg.tar.xz

%NAME%
ca-certificates

%BASE%
ca-certificates

%VERSION%
20150402-1

%DESC%
Common CA certificates (default providers)

%CSIZE%
1344

%ISIZE%
1024

%MD5SUM%
9a3bf9b4db4e1f8d1e3b7f4b0cf1b7a6

%URL%
http://pkgs.fedoraproject.org/cgit/ca-certificates.git

%LICENSE%
GPL2

%ARCH%
any

%BUILDDATE%
1428150023

%PACKAGER%
Jan de Groot <jgc@archlinux.org>

%DEPENDS%
ca-certificates-mozilla
ca-certificates-cacert

%MAKEDEPENDS%
asciidoc
p11-kit

%OPTDEPENDS%
perl: for c_rehash
";

    #[test]
    fn test_parse_desc() {
        let mut pkg = Package::default();
        parse_desc(DESC, &mut pkg).unwrap();

        assert_eq!(pkg.filename, "ca-certificates-20150402-1-any.pkg.tar.xz");
        assert_eq!(pkg.name, "ca-certificates");
        assert_eq!(pkg.version, "20150402-1");
        assert_eq!(pkg.arch, "any");
        assert_eq!(pkg.license, "GPL2");
        assert_eq!(pkg.packager, "Jan de Groot <jgc@archlinux.org>");
        assert_eq!(pkg.build_date.unwrap().timestamp(), 1_428_150_023);
        assert_eq!(
            pkg.depends,
            vec!["ca-certificates-mozilla", "ca-certificates-cacert"]
        );
        assert_eq!(pkg.makedepends, vec!["asciidoc", "p11-kit"]);
        assert_eq!(pkg.optdepends, vec!["perl: for c_rehash"]);
        assert!(pkg.files.is_empty());
    }

    #[test]
    fn test_scalar_keeps_last_line() {
        let mut pkg = Package::default();
        parse_desc("%DESC%\nfirst\nsecond\n", &mut pkg).unwrap();
        assert_eq!(pkg.description, "second");
    }

    #[test]
    fn test_unknown_marker_is_ignored() {
        let mut pkg = Package::default();
        parse_desc("%XDATA%\npkgtype=pkg\n\n%NAME%\nzlib\n", &mut pkg).unwrap();
        assert_eq!(pkg.name, "zlib");
    }

    #[test]
    fn test_invalid_build_date() {
        let mut pkg = Package::default();
        let err = parse_desc("%BUILDDATE%\nyesterday\n", &mut pkg).unwrap_err();
        assert!(matches!(err, PackageError::InvalidRecord { .. }));
    }

    #[test]
    fn test_parse_files_with_and_without_marker() {
        let mut pkg = Package::default();
        parse_files("%FILES%\netc/\netc/ssl/\netc/ssl/certs/\n", &mut pkg).unwrap();
        assert_eq!(pkg.files, vec!["etc/", "etc/ssl/", "etc/ssl/certs/"]);

        let mut pkg = Package::default();
        parse_files("usr/\nusr/bin/\n", &mut pkg).unwrap();
        assert_eq!(pkg.files, vec!["usr/", "usr/bin/"]);
    }

    #[test]
    fn test_legacy_depends_block() {
        let mut pkg = Package::default();
        parse_desc("%DEPENDS%\nglibc\nzlib>=1.2\n\n%OPTDEPENDS%\nperl\n", &mut pkg).unwrap();
        assert_eq!(pkg.depends, vec!["glibc", "zlib>=1.2"]);
        assert_eq!(pkg.optdepends, vec!["perl"]);
    }
}

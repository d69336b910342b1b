//! Readers for gzip-compressed tar database archives
//!
//! Every entry of a database is a `<name>-<version>/` directory holding a
//! `desc` block, plus a `files` block in the file-listing database (older
//! databases also carry a separate `depends` block). A database file that
//! does not exist reads as empty.

use crate::desc::{parse_desc, parse_files};
use flate2::read::GzDecoder;
use pacsmith_errors::{Error, PackageError, StorageError};
use pacsmith_types::{split_name_version, Package};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tar::Archive;
use tokio::task;

type DbArchive = Archive<GzDecoder<File>>;

/// Open a database archive, `None` if it does not exist
fn open(path: &Path) -> Result<Option<DbArchive>, Error> {
    match File::open(path) {
        Ok(file) => Ok(Some(Archive::new(GzDecoder::new(file)))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::from_io_with_path(&e, path).into()),
    }
}

fn read_err(path: &Path) -> impl Fn(io::Error) -> Error + '_ {
    move |e| StorageError::archive_read(path, e).into()
}

/// Split an archive path into its entry directory and the member name
fn split_entry_path(path: &str) -> (&str, Option<&str>) {
    let path = path.strip_prefix("./").unwrap_or(path);
    match path.split_once('/') {
        Some((dir, "")) => (dir, None),
        Some((dir, member)) => (dir, Some(member)),
        None => (path, None),
    }
}

async fn blocking<T, F>(path: &Path, f: F) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce(PathBuf) -> Result<T, Error> + Send + 'static,
{
    let owned = path.to_path_buf();
    task::spawn_blocking(move || f(owned))
        .await
        .map_err(|e| Error::internal(format!("archive reader task failed: {e}")))?
}

/// Version recorded for `name`, scanning directory entries only
///
/// # Errors
///
/// Returns an error if the archive exists but cannot be decoded.
pub async fn entry_version(db: &Path, name: &str) -> Result<Option<String>, Error> {
    let name = name.to_string();
    blocking(db, move |path| entry_version_blocking(&path, &name)).await
}

fn entry_version_blocking(path: &Path, name: &str) -> Result<Option<String>, Error> {
    let Some(mut archive) = open(path)? else {
        return Ok(None);
    };

    for entry in archive.entries().map_err(read_err(path))? {
        let entry = entry.map_err(read_err(path))?;
        if !entry.header().entry_type().is_dir() {
            continue;
        }
        let entry_path = entry.path().map_err(read_err(path))?;
        let entry_path = entry_path.to_string_lossy();
        let (dir, _) = split_entry_path(&entry_path);
        if let Some((entry_name, version)) = split_name_version(dir) {
            if entry_name == name {
                return Ok(Some(version.to_string()));
            }
        }
    }

    Ok(None)
}

/// Parse the entries of a database
///
/// With `only` set, the result holds at most the entry of that package.
/// `files` blocks are read only when `with_files` is set.
///
/// # Errors
///
/// Returns an error if the archive exists but cannot be decoded or holds a
/// malformed record.
pub async fn read_packages(
    db: &Path,
    only: Option<&str>,
    with_files: bool,
) -> Result<Vec<Package>, Error> {
    let only = only.map(str::to_string);
    blocking(db, move |path| {
        read_packages_blocking(&path, only.as_deref(), with_files)
    })
    .await
}

fn read_packages_blocking(
    path: &Path,
    only: Option<&str>,
    with_files: bool,
) -> Result<Vec<Package>, Error> {
    let Some(mut archive) = open(path)? else {
        return Ok(Vec::new());
    };

    let mut packages: BTreeMap<String, Package> = BTreeMap::new();

    for entry in archive.entries().map_err(read_err(path))? {
        let mut entry = entry.map_err(read_err(path))?;
        let entry_path = entry.path().map_err(read_err(path))?.to_string_lossy().into_owned();
        let (dir, member) = split_entry_path(&entry_path);

        let Some((entry_name, _)) = split_name_version(dir) else {
            continue;
        };
        if only.is_some_and(|wanted| wanted != entry_name) {
            continue;
        }

        let parse: fn(&str, &mut Package) -> Result<(), PackageError> = match member {
            Some("desc" | "depends") => parse_desc,
            Some("files") if with_files => parse_files,
            _ => continue,
        };

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(read_err(path))?;
        let pkg = packages.entry(dir.to_string()).or_default();
        parse(&content, pkg)?;
    }

    Ok(packages
        .into_iter()
        .map(|(dir, mut pkg)| {
            // legacy `depends`-only entries carry no %NAME%
            if pkg.name.is_empty() {
                if let Some((name, version)) = split_name_version(&dir) {
                    pkg.name = name.to_string();
                    pkg.version = version.to_string();
                }
            }
            pkg
        })
        .collect())
}

/// Runtime dependency names of every package in a database
///
/// # Errors
///
/// Returns an error if the archive exists but cannot be decoded.
pub async fn read_dependency_map(db: &Path) -> Result<HashMap<String, Vec<String>>, Error> {
    let packages = read_packages(db, None, false).await?;
    Ok(packages
        .into_iter()
        .map(|pkg| {
            let deps = pkg.depends_names().map(str::to_string).collect();
            (pkg.name, deps)
        })
        .collect())
}

/// Parse the entry of a single package
///
/// # Errors
///
/// Returns an error if the archive exists but cannot be decoded.
pub async fn read_package(db: &Path, name: &str, with_files: bool) -> Result<Option<Package>, Error> {
    let mut packages = read_packages(db, Some(name), with_files).await?;
    Ok(packages.pop())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_entry_path() {
        assert_eq!(split_entry_path("zlib-1.2.8-4/"), ("zlib-1.2.8-4", None));
        assert_eq!(
            split_entry_path("zlib-1.2.8-4/desc"),
            ("zlib-1.2.8-4", Some("desc"))
        );
        assert_eq!(
            split_entry_path("./zlib-1.2.8-4/files"),
            ("zlib-1.2.8-4", Some("files"))
        );
        assert_eq!(split_entry_path("zlib-1.2.8-4"), ("zlib-1.2.8-4", None));
    }

    #[tokio::test]
    async fn test_missing_archive_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("missing.db.tar.gz");
        assert!(entry_version(&db, "zlib").await.unwrap().is_none());
        assert!(read_packages(&db, None, true).await.unwrap().is_empty());
        assert!(read_package(&db, "zlib", false).await.unwrap().is_none());
        assert!(read_dependency_map(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_archive_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("broken.db.tar.gz");
        std::fs::write(&db, b"definitely not gzip").unwrap();
        let err = read_packages(&db, None, false).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(StorageError::ArchiveRead { .. })
        ));
    }
}

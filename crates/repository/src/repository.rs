//! A hosted repository: one database pair per architecture
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<owner>/<name>/<arch>/<name>.db.tar.gz
//! <root>/<owner>/<name>/<arch>/<name>.files.tar.gz
//! <root>/<owner>/<name>/<arch>/<package files>
//! ```
//!
//! Each architecture has its own read/write lock. Mutations hold the write
//! lock of every architecture they touch for their whole duration; queries
//! hold read locks. Multi-architecture operations take locks in `Arch` order.

use crate::archive;
use crate::obsolete::obsolete;
use crate::writer::DatabaseWriter;
use pacsmith_errors::{Error, PackageError, RepoError, StorageError};
use pacsmith_events::{EventEmitter, EventSender, FailureContext, RepoEvent};
use pacsmith_types::{validate_repo_name, Arch, Package, PackageFilename, RepoKey, Version};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Archive index of one hosted repository
pub struct Repository {
    key: RepoKey,
    path: PathBuf,
    locks: BTreeMap<Arch, RwLock<()>>,
    writer: Arc<dyn DatabaseWriter>,
    event_sender: Option<EventSender>,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("key", &self.key)
            .field("path", &self.path)
            .field("archs", &self.archs())
            .finish_non_exhaustive()
    }
}

impl EventEmitter for Repository {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

fn validate_owner(owner: &str) -> Result<(), PackageError> {
    if owner.is_empty() || owner == "." || owner == ".." || owner.contains(['/', '\\']) {
        return Err(PackageError::InvalidRepositoryName {
            name: owner.to_string(),
        });
    }
    Ok(())
}

fn file_name(path: &Path) -> Result<&str, Error> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            PackageError::InvalidFilename {
                filename: path.display().to_string(),
            }
            .into()
        })
}

impl Repository {
    /// Create a handle for the repository `key` stored under `storage`
    ///
    /// Nothing is created on disk; see [`Repository::init_dir`].
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, no architecture is given, or
    /// `any` is listed as a hosted architecture.
    pub fn new(
        key: RepoKey,
        archs: &[Arch],
        storage: &Path,
        writer: Arc<dyn DatabaseWriter>,
    ) -> Result<Self, Error> {
        validate_owner(&key.owner)?;
        validate_repo_name(&key.name)?;

        if archs.is_empty() {
            return Err(PackageError::InvalidArch {
                arch: String::new(),
            }
            .into());
        }
        if archs.contains(&Arch::Any) {
            return Err(PackageError::InvalidArch {
                arch: Arch::Any.to_string(),
            }
            .into());
        }

        let path = storage.join(&key.owner).join(&key.name);
        let locks = archs.iter().map(|arch| (*arch, RwLock::new(()))).collect();

        Ok(Self {
            key,
            path,
            locks,
            writer,
            event_sender: None,
        })
    }

    /// Attach an event sender
    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    #[must_use]
    pub fn key(&self) -> &RepoKey {
        &self.key
    }

    /// Configured architectures, sorted
    #[must_use]
    pub fn archs(&self) -> Vec<Arch> {
        self.locks.keys().copied().collect()
    }

    /// Repository root directory
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding one architecture's databases and package files
    #[must_use]
    pub fn arch_dir(&self, arch: Arch) -> PathBuf {
        self.path.join(arch.as_str())
    }

    /// Metadata database of `arch`
    #[must_use]
    pub fn db_path(&self, arch: Arch) -> PathBuf {
        self.arch_dir(arch)
            .join(format!("{}.db.tar.gz", self.key.name))
    }

    /// File-listing database of `arch`
    #[must_use]
    pub fn files_db_path(&self, arch: Arch) -> PathBuf {
        self.arch_dir(arch)
            .join(format!("{}.files.tar.gz", self.key.name))
    }

    /// Concrete architectures a query or upload for `arch` applies to
    fn targets(&self, arch: Arch) -> Result<Vec<Arch>, Error> {
        if arch.is_any() {
            return Ok(self.archs());
        }
        if self.locks.contains_key(&arch) {
            Ok(vec![arch])
        } else {
            Err(RepoError::UnknownArch {
                repo: self.key.to_string(),
                arch: arch.to_string(),
            }
            .into())
        }
    }

    fn lock(&self, arch: Arch) -> Result<&RwLock<()>, Error> {
        self.locks.get(&arch).ok_or_else(|| {
            RepoError::UnknownArch {
                repo: self.key.to_string(),
                arch: arch.to_string(),
            }
            .into()
        })
    }

    /// Write-lock `archs` in sorted order
    async fn write_all(&self, archs: &BTreeSet<Arch>) -> Result<Vec<RwLockWriteGuard<'_, ()>>, Error> {
        let mut guards = Vec::with_capacity(archs.len());
        for arch in archs {
            guards.push(self.lock(*arch)?.write().await);
        }
        Ok(guards)
    }

    async fn read_one(&self, arch: Arch) -> Result<RwLockReadGuard<'_, ()>, Error> {
        Ok(self.lock(arch)?.read().await)
    }

    /// Create the directory of every architecture
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    pub async fn init_dir(&self) -> Result<(), Error> {
        let archs: BTreeSet<Arch> = self.locks.keys().copied().collect();
        let _guards = self.write_all(&archs).await?;

        for arch in &archs {
            let dir = self.arch_dir(*arch);
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, &dir))?;
        }

        self.emit_repo(RepoEvent::DirsInitialized {
            repo: self.key.to_string(),
            archs: archs.iter().map(ToString::to_string).collect(),
        });
        Ok(())
    }

    /// Write an empty database pair for every architecture
    ///
    /// # Errors
    ///
    /// Returns an error if the database writer fails.
    pub async fn init_empty_dbs(&self) -> Result<(), Error> {
        let archs: BTreeSet<Arch> = self.locks.keys().copied().collect();
        let _guards = self.write_all(&archs).await?;

        for arch in archs {
            self.rebuild(arch, &[]).await?;
            self.emit_repo(RepoEvent::DatabaseInitialized {
                repo: self.key.to_string(),
                arch: arch.to_string(),
            });
        }
        Ok(())
    }

    /// Remove the repository's storage entirely
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be removed.
    pub async fn clear_path(&self) -> Result<(), Error> {
        let archs: BTreeSet<Arch> = self.locks.keys().copied().collect();
        let _guards = self.write_all(&archs).await?;

        match fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::from_io_with_path(&e, &self.path).into()),
        }

        self.emit_repo(RepoEvent::StorageCleared {
            repo: self.key.to_string(),
        });
        Ok(())
    }

    // caller holds the write lock of `arch`
    async fn rebuild(&self, arch: Arch, packages: &[PathBuf]) -> Result<(), Error> {
        let result = self
            .writer
            .rebuild(&self.db_path(arch), &self.arch_dir(arch), packages)
            .await;
        if let Err(err) = &result {
            self.emit_repo(RepoEvent::WriterFailed {
                repo: self.key.to_string(),
                arch: arch.to_string(),
                failure: FailureContext::from_error(err),
            });
        }
        result.map(|_| ())
    }

    /// Place package files into their architecture directories and index them
    ///
    /// An `any` package goes into every configured architecture. Files are
    /// moved unless already in place; a detached `.sig` is placed next to its
    /// package but not handed to the writer. The writer runs once per touched
    /// architecture.
    ///
    /// # Errors
    ///
    /// Returns an error if a filename is invalid or targets an architecture
    /// the repository does not host, if a file cannot be placed, or if the
    /// writer fails (the error carries the writer's output).
    pub async fn add(&self, package_paths: &[PathBuf]) -> Result<(), Error> {
        if package_paths.is_empty() {
            return Ok(());
        }

        let mut plan = Vec::with_capacity(package_paths.len());
        for path in package_paths {
            let name = file_name(path)?;
            let parsed = PackageFilename::parse(name)?;
            let targets = self.targets(parsed.arch)?;
            plan.push((path, name, targets));
        }

        let touched: BTreeSet<Arch> = plan
            .iter()
            .flat_map(|(_, _, targets)| targets.iter().copied())
            .collect();
        let _guards = self.write_all(&touched).await?;

        let mut per_arch: BTreeMap<Arch, Vec<PathBuf>> = BTreeMap::new();
        for (source, name, targets) in plan {
            let placed = self.place(source, name, &targets).await?;
            if name.ends_with(".sig") {
                continue;
            }
            for (arch, dest) in targets.iter().zip(placed) {
                per_arch.entry(*arch).or_default().push(dest);
            }
        }

        for (arch, files) in per_arch {
            self.rebuild(arch, &files).await?;
            self.emit_repo(RepoEvent::PackagesAdded {
                repo: self.key.to_string(),
                arch: arch.to_string(),
                files: files
                    .iter()
                    .filter_map(|f| f.file_name())
                    .map(|f| f.to_string_lossy().into_owned())
                    .collect(),
            });
        }

        Ok(())
    }

    /// Put `source` into each target directory, returning the destinations
    /// in target order
    async fn place(&self, source: &Path, name: &str, targets: &[Arch]) -> Result<Vec<PathBuf>, Error> {
        let destinations: Vec<PathBuf> = targets
            .iter()
            .map(|arch| self.arch_dir(*arch).join(name))
            .collect();

        let source_abs = absolute(source).await;
        let mut source_is_destination = false;
        for dest in &destinations {
            if absolute(dest).await == source_abs {
                source_is_destination = true;
                continue;
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StorageError::from_io_with_path(&e, parent))?;
            }
            fs::copy(source, dest)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, source))?;
        }

        if !source_is_destination {
            fs::remove_file(source)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, source))?;
        }

        Ok(destinations)
    }

    /// Remove packages from one architecture's database and delete their files
    ///
    /// The writer only updates the index; files of every entry it reports as
    /// removed are deleted from the architecture directory afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if `arch` is not hosted, the writer fails, or a
    /// residual file cannot be deleted.
    pub async fn remove(&self, names: &[String], arch: Arch) -> Result<Vec<PathBuf>, Error> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        if arch.is_any() {
            return Err(RepoError::UnknownArch {
                repo: self.key.to_string(),
                arch: arch.to_string(),
            }
            .into());
        }

        let _guard = self.lock(arch)?.write().await;
        let dir = self.arch_dir(arch);

        let output = match self.writer.remove(&self.db_path(arch), &dir, names).await {
            Ok(output) => output,
            Err(err) => {
                self.emit_repo(RepoEvent::WriterFailed {
                    repo: self.key.to_string(),
                    arch: arch.to_string(),
                    failure: FailureContext::from_error(&err),
                });
                return Err(err);
            }
        };

        let removed = output.removed_entries()?;
        let mut deleted = Vec::new();
        if !removed.is_empty() {
            let mut entries = fs::read_dir(&dir)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, &dir))?;
            while let Some(entry) = entries.next_entry().await? {
                let file_name = entry.file_name();
                let Some(file_name) = file_name.to_str() else {
                    continue;
                };
                let Ok(parsed) = PackageFilename::parse(file_name) else {
                    continue;
                };
                let entry_name = parsed.entry_name();
                if removed
                    .iter()
                    .any(|r| *r == parsed.name || *r == entry_name)
                {
                    let path = entry.path();
                    fs::remove_file(&path)
                        .await
                        .map_err(|e| StorageError::from_io_with_path(&e, &path))?;
                    deleted.push(path);
                }
            }
        }
        deleted.sort();

        self.emit_repo(RepoEvent::PackagesRemoved {
            repo: self.key.to_string(),
            arch: arch.to_string(),
            names: removed,
            deleted_files: deleted
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        });
        Ok(deleted)
    }

    /// Whether `version` of `name` would be an update for `arch`
    ///
    /// `any` checks every hosted architecture: the package is new unless at
    /// least one database holds it at an equal or newer version. A missing
    /// database holds nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if `arch` is not hosted, a database cannot be read,
    /// or a recorded version is malformed.
    pub async fn is_new(&self, name: &str, arch: Arch, version: &Version) -> Result<bool, Error> {
        for target in self.targets(arch)? {
            let _guard = self.read_one(target).await?;
            let Some(recorded) = archive::entry_version(&self.db_path(target), name).await? else {
                continue;
            };
            let recorded = Version::parse(&recorded)?;
            if !version.is_newer_than(&recorded) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// [`Repository::is_new`] for a package filename
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidFilename` for a malformed filename, and
    /// the errors of [`Repository::is_new`].
    pub async fn is_new_filename(&self, filename: &str) -> Result<bool, Error> {
        let parsed = PackageFilename::parse(filename)?;
        let version = parsed.parsed_version()?;
        self.is_new(&parsed.name, parsed.arch, &version).await
    }

    /// One package of `arch`, `None` if absent
    ///
    /// With `files`, the record is read from the file-listing database and
    /// carries its file list.
    ///
    /// # Errors
    ///
    /// Returns an error if `arch` is not hosted or the database is unreadable.
    pub async fn package(&self, name: &str, arch: Arch, files: bool) -> Result<Option<Package>, Error> {
        let _guard = self.read_one(arch).await?;
        let db = if files {
            self.files_db_path(arch)
        } else {
            self.db_path(arch)
        };
        archive::read_package(&db, name, files).await
    }

    /// Every package of `arch`, sorted by entry name
    ///
    /// # Errors
    ///
    /// Returns an error if `arch` is not hosted or the database is unreadable.
    pub async fn packages(&self, arch: Arch, files: bool) -> Result<Vec<Package>, Error> {
        let _guard = self.read_one(arch).await?;
        let db = if files {
            self.files_db_path(arch)
        } else {
            self.db_path(arch)
        };
        archive::read_packages(&db, None, files).await
    }

    /// Packages of `arch` that are neither in `keep` nor needed by them
    ///
    /// # Errors
    ///
    /// Returns an error if `arch` is not hosted or the database is unreadable.
    pub async fn obsolete(&self, keep: &[String], arch: Arch) -> Result<Vec<String>, Error> {
        let _guard = self.read_one(arch).await?;
        let deps = archive::read_dependency_map(&self.db_path(arch)).await?;
        Ok(obsolete(
            deps.keys().map(String::as_str),
            keep.iter().map(String::as_str),
            &deps,
        ))
    }
}

async fn absolute(path: &Path) -> PathBuf {
    match fs::canonicalize(path).await {
        Ok(path) => path,
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::WriterOutput;
    use async_trait::async_trait;

    struct NoopWriter;

    #[async_trait]
    impl DatabaseWriter for NoopWriter {
        async fn rebuild(&self, _: &Path, _: &Path, _: &[PathBuf]) -> Result<WriterOutput, Error> {
            Ok(WriterOutput::default())
        }

        async fn remove(&self, _: &Path, _: &Path, _: &[String]) -> Result<WriterOutput, Error> {
            Ok(WriterOutput::default())
        }
    }

    fn repo(archs: &[Arch]) -> Result<Repository, Error> {
        Repository::new(
            RepoKey::new("owner", "repo"),
            archs,
            Path::new("/srv/storage"),
            Arc::new(NoopWriter),
        )
    }

    #[test]
    fn test_paths() {
        let repo = repo(&[Arch::X86_64]).unwrap();
        assert_eq!(repo.path(), Path::new("/srv/storage/owner/repo"));
        assert_eq!(
            repo.db_path(Arch::X86_64),
            PathBuf::from("/srv/storage/owner/repo/x86_64/repo.db.tar.gz")
        );
        assert_eq!(
            repo.files_db_path(Arch::X86_64),
            PathBuf::from("/srv/storage/owner/repo/x86_64/repo.files.tar.gz")
        );
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(repo(&[]).is_err());
        assert!(repo(&[Arch::Any]).is_err());
        assert!(Repository::new(
            RepoKey::new("..", "repo"),
            &[Arch::X86_64],
            Path::new("/srv"),
            Arc::new(NoopWriter),
        )
        .is_err());
        assert!(Repository::new(
            RepoKey::new("owner", "Bad Name"),
            &[Arch::X86_64],
            Path::new("/srv"),
            Arc::new(NoopWriter),
        )
        .is_err());
    }

    #[test]
    fn test_targets() {
        let repo = repo(&[Arch::I686, Arch::X86_64]).unwrap();
        assert_eq!(repo.targets(Arch::Any).unwrap(), vec![Arch::X86_64, Arch::I686]);
        assert_eq!(repo.targets(Arch::I686).unwrap(), vec![Arch::I686]);
        assert!(matches!(
            repo.targets(Arch::Aarch64),
            Err(Error::Repo(RepoError::UnknownArch { .. }))
        ));
    }
}

//! Persistence of hosted repository records

use async_trait::async_trait;
use pacsmith_errors::{Error, RemoteError};
use pacsmith_types::{RepoKey, RepoRecord};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// Where hosted repositories and their last check times live
#[async_trait]
pub trait RepoStore: Send + Sync {
    async fn list(&self) -> Result<Vec<RepoRecord>, Error>;

    /// Replace the stored record with the same identity
    async fn update(&self, record: &RepoRecord) -> Result<(), Error>;
}

/// Records kept as a JSON array in one file
#[derive(Debug)]
pub struct FileRepoStore {
    path: PathBuf,
    lock: Mutex<()>,
}

fn store_err(message: impl Into<String>) -> Error {
    RemoteError::StoreFailed {
        message: message.into(),
    }
    .into()
}

impl FileRepoStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<RepoRecord>, Error> {
        match fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| store_err(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(Error::io_with_path(&e, &self.path)),
        }
    }

    async fn save(&self, records: &[RepoRecord]) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io_with_path(&e, parent))?;
        }
        let content = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .await
            .map_err(|e| Error::io_with_path(&e, &tmp))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::io_with_path(&e, &self.path))?;
        Ok(())
    }

    /// Look up one record
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn get(&self, key: &RepoKey) -> Result<Option<RepoRecord>, Error> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|r| r.key() == *key))
    }

    /// Register a new repository
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::StoreFailed` if a record with the same identity
    /// exists, or an error if the file cannot be read or written.
    pub async fn create(&self, record: RepoRecord) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        if records.iter().any(|r| r.key() == record.key()) {
            return Err(store_err(format!("repository {} already exists", record.key())));
        }
        records.push(record);
        self.save(&records).await
    }

    /// Remove a repository, returning its record if there was one
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    pub async fn delete(&self, key: &RepoKey) -> Result<Option<RepoRecord>, Error> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let Some(pos) = records.iter().position(|r| r.key() == *key) else {
            return Ok(None);
        };
        let removed = records.remove(pos);
        self.save(&records).await?;
        Ok(Some(removed))
    }
}

#[async_trait]
impl RepoStore for FileRepoStore {
    async fn list(&self) -> Result<Vec<RepoRecord>, Error> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn update(&self, record: &RepoRecord) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        let Some(slot) = records.iter_mut().find(|r| r.key() == record.key()) else {
            return Err(store_err(format!("repository {} not found", record.key())));
        };
        *slot = record.clone();
        self.save(&records).await
    }
}

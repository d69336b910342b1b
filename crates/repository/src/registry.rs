//! Shared repository handles
//!
//! Every caller that touches a repository must go through the same
//! [`Repository`] so that they share its architecture locks.

use crate::repository::Repository;
use crate::writer::DatabaseWriter;
use dashmap::DashMap;
use pacsmith_errors::Error;
use pacsmith_events::EventSender;
use pacsmith_types::{RepoKey, RepoRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Process-wide map of open repositories
pub struct RepositoryRegistry {
    storage: PathBuf,
    writer: Arc<dyn DatabaseWriter>,
    event_sender: Option<EventSender>,
    repos: DashMap<RepoKey, Arc<Repository>>,
}

impl RepositoryRegistry {
    #[must_use]
    pub fn new(storage: impl Into<PathBuf>, writer: Arc<dyn DatabaseWriter>) -> Self {
        Self {
            storage: storage.into(),
            writer,
            event_sender: None,
            repos: DashMap::new(),
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    #[must_use]
    pub fn storage(&self) -> &Path {
        &self.storage
    }

    /// Handle for `record`, created on first use
    ///
    /// The architectures of an already open handle are not updated; call
    /// [`RepositoryRegistry::forget`] after a record changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the record's name or architectures are invalid.
    pub fn repository(&self, record: &RepoRecord) -> Result<Arc<Repository>, Error> {
        let key = record.key();
        if let Some(repo) = self.repos.get(&key) {
            return Ok(Arc::clone(repo.value()));
        }

        let mut repo = Repository::new(
            key.clone(),
            &record.archs,
            &self.storage,
            Arc::clone(&self.writer),
        )?;
        if let Some(sender) = &self.event_sender {
            repo = repo.with_event_sender(sender.clone());
        }

        // a concurrent caller may have won the race
        let entry = self.repos.entry(key).or_insert_with(|| Arc::new(repo));
        Ok(Arc::clone(entry.value()))
    }

    /// Already open handle for `key`
    #[must_use]
    pub fn get(&self, key: &RepoKey) -> Option<Arc<Repository>> {
        self.repos.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Drop the handle for `key`; outstanding clones stay usable
    pub fn forget(&self, key: &RepoKey) -> Option<Arc<Repository>> {
        self.repos.remove(key).map(|(_, repo)| repo)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.repos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

impl std::fmt::Debug for RepositoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryRegistry")
            .field("storage", &self.storage)
            .field("open", &self.repos.len())
            .finish_non_exhaustive()
    }
}

//! Component wiring

use crate::error::CliError;
use pacsmith_checker::{Checker, FileRepoStore, HttpRemote, UpdateState};
use pacsmith_config::Config;
use pacsmith_events::EventSender;
use pacsmith_repository::{prepare_storage, RepoTools, Repository, RepositoryRegistry};
use pacsmith_resolver::{AurClient, UpdateResolver};
use pacsmith_types::RepoKey;
use std::sync::Arc;
use tracing::{debug, info};

/// Long-lived components shared by every command
pub struct Context {
    config: Config,
    store: Arc<FileRepoStore>,
    registry: Arc<RepositoryRegistry>,
    state: Arc<UpdateState>,
    event_sender: EventSender,
}

impl Context {
    /// Prepare the storage root and build the shared components
    pub async fn initialize(config: Config, event_sender: EventSender) -> Result<Self, CliError> {
        info!(storage = %config.storage_path().display(), "Preparing repository storage");
        prepare_storage(config.storage_path()).await?;

        let writer = Arc::new(RepoTools::new(
            config.tools.repo_add.clone(),
            config.tools.repo_remove.clone(),
        ));
        let registry = RepositoryRegistry::new(config.storage_path(), writer)
            .with_event_sender(event_sender.clone());
        let store = FileRepoStore::new(config.registry_path());
        debug!(registry = %store.path().display(), "Using repository registry");

        Ok(Self {
            state: Arc::new(UpdateState::new(config.checker.state_ttl())),
            store: Arc::new(store),
            registry: Arc::new(registry),
            config,
            event_sender,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &FileRepoStore {
        &self.store
    }

    pub fn registry(&self) -> &RepositoryRegistry {
        &self.registry
    }

    pub fn state(&self) -> &UpdateState {
        &self.state
    }

    pub fn event_sender(&self) -> &EventSender {
        &self.event_sender
    }

    /// Handle of a registered repository
    pub async fn repository(&self, key: &RepoKey) -> Result<Arc<Repository>, CliError> {
        let record = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| CliError::UnknownRepository(key.to_string()))?;
        Ok(self.registry.repository(&record)?)
    }

    /// Update checker over the registry, the AUR and the configured remote
    pub fn checker(&self) -> Result<Checker, CliError> {
        let upstream = &self.config.upstream;
        let aur = AurClient::new(upstream.url.clone(), upstream.timeout(), upstream.batch_size)?;
        let remote = HttpRemote::from_config(&self.config.remote, upstream.timeout())?;
        let resolver =
            UpdateResolver::new(Arc::new(aur)).with_event_sender(self.event_sender.clone());

        Ok(Checker::new(
            self.store.clone(),
            Arc::new(remote),
            resolver,
            self.registry.clone(),
            self.state.clone(),
            self.config.checker.clone(),
        )
        .with_event_sender(self.event_sender.clone()))
    }
}

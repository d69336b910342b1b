//! Timer-driven update checker

use crate::remote::Remote;
use crate::state::UpdateState;
use crate::store::RepoStore;
use chrono::{DateTime, Utc};
use pacsmith_config::CheckerConfig;
use pacsmith_errors::Error;
use pacsmith_events::{CheckerEvent, EventEmitter, EventSender, FailureContext};
use pacsmith_repository::RepositoryRegistry;
use pacsmith_resolver::UpdateResolver;
use pacsmith_types::{RepoKey, RepoRecord};
use std::future::Future;
use std::sync::Arc;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Kind of a build request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// Upstream has a newer version
    Update,
    /// Devel package whose source may have moved
    Check,
}

impl BatchKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Check => "check",
        }
    }

    /// Commit message of a build request, e.g. `update:a,b:aur`
    #[must_use]
    pub fn message(self, names: &[String]) -> String {
        format!("{}:{}:aur", self.as_str(), names.join(","))
    }
}

/// Outcome of one pass over all repositories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub checked: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Finds updates for every hosted repository and requests builds
pub struct Checker {
    store: Arc<dyn RepoStore>,
    remote: Arc<dyn Remote>,
    resolver: UpdateResolver,
    registry: Arc<RepositoryRegistry>,
    state: Arc<UpdateState>,
    config: CheckerConfig,
    event_sender: Option<EventSender>,
}

impl EventEmitter for Checker {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl Checker {
    #[must_use]
    pub fn new(
        store: Arc<dyn RepoStore>,
        remote: Arc<dyn Remote>,
        resolver: UpdateResolver,
        registry: Arc<RepositoryRegistry>,
        state: Arc<UpdateState>,
        config: CheckerConfig,
    ) -> Self {
        Self {
            store,
            remote,
            resolver,
            registry,
            state,
            config,
            event_sender: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    #[must_use]
    pub fn state(&self) -> &Arc<UpdateState> {
        &self.state
    }

    fn cooldown(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.config.cooldown()).unwrap_or(chrono::Duration::MAX)
    }

    /// Tick until `shutdown` resolves
    ///
    /// The first sweep runs one interval after start. Expired in-flight
    /// entries are swept by a separate task on its own interval.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        self.emit_checker(CheckerEvent::Started {
            interval_secs: self.config.interval_secs,
            cooldown_secs: self.config.cooldown_secs,
        });

        let sweeper = tokio::spawn(sweep_state(
            Arc::clone(&self.state),
            self.config.sweep(),
            self.event_sender.clone(),
        ));

        let period = self.config.interval();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    self.check_all().await;
                }
            }
        }

        sweeper.abort();
    }

    /// Check every repository that is due
    ///
    /// A failing repository is reported and skipped; the others are still
    /// checked.
    pub async fn check_all(&self) -> SweepSummary {
        self.check_all_at(Utc::now()).await
    }

    pub async fn check_all_at(&self, now: DateTime<Utc>) -> SweepSummary {
        let mut summary = SweepSummary::default();

        let records = match self.store.list().await {
            Ok(records) => records,
            Err(err) => {
                self.emit_operation_failed("list repositories", &err);
                return summary;
            }
        };
        self.emit_checker(CheckerEvent::SweepStarted {
            repositories: records.len(),
        });

        let cooldown = self.cooldown();
        for record in records {
            if !record.is_due(now, cooldown) {
                if let Some(next_check) = record.next_check(cooldown) {
                    self.emit_checker(CheckerEvent::RepoSkipped {
                        repo: record.key().to_string(),
                        next_check,
                    });
                }
                summary.skipped += 1;
                continue;
            }

            match self.check_repo(record.clone(), now).await {
                Ok(_) => summary.checked += 1,
                Err(err) => {
                    self.emit_checker(CheckerEvent::RepoFailed {
                        repo: record.key().to_string(),
                        failure: FailureContext::from_error(&err),
                    });
                    summary.failed += 1;
                }
            }
        }

        self.emit_checker(CheckerEvent::SweepCompleted {
            checked: summary.checked,
            failed: summary.failed,
        });
        summary
    }

    /// Resolve one repository, request builds and record the check time
    ///
    /// Returns the number of build requests sent. A failed build request does
    /// not fail the check.
    ///
    /// # Errors
    ///
    /// Returns an error if the package configuration cannot be fetched, the
    /// resolution fails, or the new check time cannot be stored.
    pub async fn check_repo(&self, mut record: RepoRecord, now: DateTime<Utc>) -> Result<usize, Error> {
        let key = record.key();
        let config = self.remote.pkg_config(&record).await?;
        if config.is_empty() {
            self.emit_warning("no AUR packages tracked", Some(key.to_string()));
        }
        let repo = self.registry.repository(&record)?;
        let groups = self
            .resolver
            .resolve(&key.to_string(), &config.aur, &*repo)
            .await?;

        let mut triggered = 0;
        for group in &groups {
            for (kind, names) in [
                (BatchKind::Update, &group.updates),
                (BatchKind::Check, &group.rechecks),
            ] {
                if self.request(&record, &key, kind, names).await {
                    triggered += 1;
                }
            }
        }

        record.last_check = Some(now);
        self.store.update(&record).await?;
        self.emit_checker(CheckerEvent::RepoChecked {
            repo: key.to_string(),
            triggered,
            last_check: now,
        });
        Ok(triggered)
    }

    /// Send one build request for the names not already in flight
    async fn request(&self, record: &RepoRecord, key: &RepoKey, kind: BatchKind, names: &[String]) -> bool {
        let (active, pending): (Vec<String>, Vec<String>) = names
            .iter()
            .cloned()
            .partition(|name| self.state.is_active(name, key).0);

        if !active.is_empty() {
            self.emit_checker(CheckerEvent::Suppressed {
                repo: key.to_string(),
                names: active,
            });
        }
        if pending.is_empty() {
            return false;
        }

        let message = kind.message(&pending);
        match self.remote.trigger(record, &message).await {
            Ok(()) => {
                for name in &pending {
                    self.state.add(name, key);
                }
                self.emit_checker(CheckerEvent::BuildTriggered {
                    repo: key.to_string(),
                    message,
                });
                true
            }
            Err(err) => {
                self.emit_checker(CheckerEvent::BuildTriggerFailed {
                    repo: key.to_string(),
                    message,
                    failure: FailureContext::from_error(&err),
                });
                false
            }
        }
    }
}

async fn sweep_state(state: Arc<UpdateState>, period: std::time::Duration, events: Option<EventSender>) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let removed = state.clear_expired();
        if removed > 0 {
            events.emit_checker(CheckerEvent::StateSwept { removed });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_messages() {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(BatchKind::Update.message(&names), "update:a,b,c:aur");
        assert_eq!(BatchKind::Check.message(&names[..1]), "check:a:aur");
    }
}

use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventMeta, EventSource};
use pacsmith_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code from the error taxonomy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod checker;
pub mod general;
pub mod repo;
pub mod resolver;

pub use checker::*;
pub use general::*;
pub use repo::*;
pub use resolver::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Repository database events (add, remove, init)
    Repo(RepoEvent),

    /// Dependency resolution events
    Resolver(ResolverEvent),

    /// Update checker loop events
    Checker(CheckerEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::General,
            Self::Repo(_) => EventSource::Repo,
            Self::Resolver(_) => EventSource::Resolver,
            Self::Checker(_) => EventSource::Checker,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::OperationFailed { .. })
            | Self::Repo(RepoEvent::WriterFailed { .. })
            | Self::Resolver(ResolverEvent::ResolutionFailed { .. })
            | Self::Checker(
                CheckerEvent::RepoFailed { .. } | CheckerEvent::BuildTriggerFailed { .. },
            ) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Repo(RepoEvent::PackageRejected { .. })
            | Self::Resolver(ResolverEvent::PackagesNotFound { .. }) => Level::WARN,

            Self::Resolver(ResolverEvent::UpstreamQueried { .. })
            | Self::Checker(
                CheckerEvent::RepoSkipped { .. }
                | CheckerEvent::Suppressed { .. }
                | CheckerEvent::StateSwept { .. },
            ) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "pacsmith::events::general",
            Self::Repo(_) => "pacsmith::events::repo",
            Self::Resolver(_) => "pacsmith::events::resolver",
            Self::Checker(_) => "pacsmith::events::checker",
        }
    }

    /// Repository identity the event concerns, if any
    #[must_use]
    pub fn repo(&self) -> Option<&str> {
        let repo = match self {
            Self::General(GeneralEvent::Warning {
                context: Some(repo),
                ..
            }) => repo,
            Self::General(_) => return None,
            Self::Repo(
                RepoEvent::DirsInitialized { repo, .. }
                | RepoEvent::DatabaseInitialized { repo, .. }
                | RepoEvent::PackagesAdded { repo, .. }
                | RepoEvent::PackagesRemoved { repo, .. }
                | RepoEvent::PackageRejected { repo, .. }
                | RepoEvent::WriterFailed { repo, .. }
                | RepoEvent::StorageCleared { repo },
            )
            | Self::Resolver(
                ResolverEvent::ResolutionStarted { repo, .. }
                | ResolverEvent::ResolutionCompleted { repo, .. }
                | ResolverEvent::ResolutionFailed { repo, .. },
            )
            | Self::Checker(
                CheckerEvent::RepoSkipped { repo, .. }
                | CheckerEvent::Suppressed { repo, .. }
                | CheckerEvent::BuildTriggered { repo, .. }
                | CheckerEvent::BuildTriggerFailed { repo, .. }
                | CheckerEvent::RepoChecked { repo, .. }
                | CheckerEvent::RepoFailed { repo, .. }
                | CheckerEvent::StateCleared { repo, .. },
            ) => repo,
            Self::Resolver(
                ResolverEvent::UpstreamQueried { .. } | ResolverEvent::PackagesNotFound { .. },
            )
            | Self::Checker(
                CheckerEvent::Started { .. }
                | CheckerEvent::SweepStarted { .. }
                | CheckerEvent::SweepCompleted { .. }
                | CheckerEvent::StateSwept { .. },
            ) => return None,
        };
        Some(repo.as_str())
    }

    /// Metadata for this emission, correlated by repository when known
    #[must_use]
    pub fn meta(&self) -> EventMeta {
        let meta = EventMeta::new(EventLevel::from(self.log_level()), self.event_source());
        match self.repo() {
            Some(repo) => meta.with_correlation_id(repo),
            None => meta,
        }
    }

    /// Get structured fields for logging
    #[must_use]
    pub fn log_fields(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Update checker loop events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CheckerEvent {
    /// Checker loop started
    Started {
        interval_secs: u64,
        cooldown_secs: u64,
    },

    /// A tick began scanning the hosted repositories
    SweepStarted { repositories: usize },

    /// Repository checked too recently
    RepoSkipped {
        repo: String,
        next_check: DateTime<Utc>,
    },

    /// Names dropped because a build request is still in flight
    Suppressed { repo: String, names: Vec<String> },

    /// A build request was sent
    BuildTriggered { repo: String, message: String },

    /// A build request failed; the repository is still marked checked
    BuildTriggerFailed {
        repo: String,
        message: String,
        failure: FailureContext,
    },

    /// Repository fully processed
    RepoChecked {
        repo: String,
        triggered: usize,
        last_check: DateTime<Utc>,
    },

    /// Repository skipped for this tick after an error
    RepoFailed {
        repo: String,
        failure: FailureContext,
    },

    /// Tick finished
    SweepCompleted { checked: usize, failed: usize },

    /// Expired in-flight entries removed
    StateSwept { removed: usize },

    /// An in-flight entry was cleared after its package landed
    StateCleared { repo: String, package: String },
}

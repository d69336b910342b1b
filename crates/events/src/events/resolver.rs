use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Dependency discovery and grouping events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResolverEvent {
    /// Resolution started for a repository's tracked packages
    ResolutionStarted { repo: String, roots: Vec<String> },

    /// One batch of names sent to the upstream source
    UpstreamQueried { requested: usize, found: usize },

    /// Names the upstream source does not know
    PackagesNotFound { names: Vec<String> },

    /// Graph built and grouped
    ResolutionCompleted {
        repo: String,
        nodes: usize,
        groups: usize,
        updates: usize,
        rechecks: usize,
    },

    /// Resolution aborted, partial groups discarded
    ResolutionFailed {
        repo: String,
        failure: FailureContext,
    },
}

use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Repository database events
///
/// `repo` is the `owner/name` identity, `arch` the database architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RepoEvent {
    /// Architecture directories created
    DirsInitialized { repo: String, archs: Vec<String> },

    /// Empty databases written for a fresh repository
    DatabaseInitialized { repo: String, arch: String },

    /// Package files placed and indexed
    PackagesAdded {
        repo: String,
        arch: String,
        files: Vec<String>,
    },

    /// Entries removed from the database
    PackagesRemoved {
        repo: String,
        arch: String,
        names: Vec<String>,
        deleted_files: Vec<String>,
    },

    /// An upload was refused because the database already has it
    PackageRejected {
        repo: String,
        filename: String,
        reason: String,
    },

    /// The external database writer exited unsuccessfully
    WriterFailed {
        repo: String,
        arch: String,
        failure: FailureContext,
    },

    /// All storage for a repository was removed
    StorageCleared { repo: String },
}

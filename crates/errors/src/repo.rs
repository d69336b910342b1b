//! Repository database error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum RepoError {
    /// The external database writer exited unsuccessfully. `output` holds the
    /// captured stdout and stderr of the invocation.
    #[error("{tool} failed ({status}): {output}")]
    WriterFailed {
        tool: String,
        status: String,
        output: String,
    },

    #[error("failed to launch {tool}: {message}")]
    WriterUnavailable { tool: String, message: String },

    #[error("architecture {arch} is not configured for repository {repo}")]
    UnknownArch { repo: String, arch: String },

    #[error("repository not found: {repo}")]
    NotFound { repo: String },
}

impl UserFacingError for RepoError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::WriterUnavailable { .. } => {
                Some("Install pacman's repo-add/repo-remove or point [tools] at them.")
            }
            Self::UnknownArch { .. } => Some("Add the architecture to the repository first."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::WriterFailed { .. } => "repo.writer_failed",
            Self::WriterUnavailable { .. } => "repo.writer_unavailable",
            Self::UnknownArch { .. } => "repo.unknown_arch",
            Self::NotFound { .. } => "repo.not_found",
        };
        Some(code)
    }
}

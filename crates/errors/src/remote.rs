//! Errors raised by the collaborators the checker talks to

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RemoteError {
    #[error("build trigger for {repo} failed: {message}")]
    BuildTrigger { repo: String, message: String },

    #[error("failed to fetch package config for {repo}: {message}")]
    ConfigFetch { repo: String, message: String },

    #[error("repository store failure: {message}")]
    StoreFailed { message: String },
}

impl UserFacingError for RemoteError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigFetch { .. } => {
                Some("Make sure packages.yml exists on the source branch and is valid YAML.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        true
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::BuildTrigger { .. } => "remote.build_trigger",
            Self::ConfigFetch { .. } => "remote.config_fetch",
            Self::StoreFailed { .. } => "remote.store_failed",
        };
        Some(code)
    }
}

//! Errors talking to the AUR RPC and other HTTP endpoints

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetworkError {
    /// The upstream answered, but not with something usable.
    #[error("upstream query failed: {message}")]
    UpstreamQuery { message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("could not reach upstream: {0}")]
    ConnectionRefused(String),

    #[error("upstream returned HTTP {status}: {message}")]
    HttpError { status: u16, message: String },
}

impl NetworkError {
    /// HTTP status of the failed response, if there was one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        if self.is_retryable() {
            Some("The next scheduled check retries automatically.")
        } else {
            None
        }
    }

    fn is_retryable(&self) -> bool {
        match self.status() {
            Some(status) => status == 429 || status >= 500,
            None => true,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::UpstreamQuery { .. } => "network.upstream_query",
            Self::Timeout { .. } => "network.timeout",
            Self::ConnectionRefused(_) => "network.unreachable",
            Self::HttpError { .. } => "network.http_status",
        })
    }
}

#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types shared by the pacsmith crates
//!
//! Each subsystem has its own enum; [`Error`] wraps them at crate
//! boundaries. Everything is `Clone` so failures can ride along in events.

use std::borrow::Cow;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub mod config;
pub mod network;
pub mod package;
pub mod remote;
pub mod repo;
pub mod storage;
pub mod version;

pub use config::ConfigError;
pub use network::NetworkError;
pub use package::PackageError;
pub use remote::RemoteError;
pub use repo::RepoError;
pub use storage::StorageError;
pub use version::VersionError;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("repository: {0}")]
    Repo(#[from] RepoError),

    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("upstream: {0}")]
    Network(#[from] NetworkError),

    #[error("remote: {0}")]
    Remote(#[from] RemoteError),

    /// A filesystem call outside the repository tree, e.g. the registry file.
    #[error("{}", io_display(.message, .path.as_deref()))]
    Io {
        message: String,
        path: Option<PathBuf>,
        retryable: bool,
    },

    /// A background task or helper broke in a way no caller can act on.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    #[must_use]
    pub fn io_with_path(err: &io::Error, path: impl Into<PathBuf>) -> Self {
        let mut wrapped = Self::from_io(err);
        if let Self::Io { path: slot, .. } = &mut wrapped {
            *slot = Some(path.into());
        }
        wrapped
    }

    fn from_io(err: &io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            path: None,
            retryable: matches!(
                err.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::from_io(&err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("json: {err}"))
    }
}

fn io_display(message: &str, path: Option<&std::path::Path>) -> String {
    match path {
        Some(path) => format!("{}: {message}", path.display()),
        None => message.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// What the CLI and the event log show for a failure
pub trait UserFacingError {
    fn user_message(&self) -> Cow<'_, str>;

    /// How the user might fix it, if there is anything to do
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether trying again later may succeed without intervention
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable dotted code, e.g. `repo.writer_failed`
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl Error {
    fn inner(&self) -> Option<&dyn UserFacingError> {
        let inner: &dyn UserFacingError = match self {
            Self::Config(e) => e,
            Self::Package(e) => e,
            Self::Version(e) => e,
            Self::Repo(e) => e,
            Self::Storage(e) => e,
            Self::Network(e) => e,
            Self::Remote(e) => e,
            Self::Io { .. } | Self::Internal(_) => return None,
        };
        Some(inner)
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self.inner() {
            Some(inner) => inner.user_message(),
            None => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        self.inner().and_then(UserFacingError::user_hint)
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Io { retryable, .. } => *retryable,
            _ => self.inner().is_some_and(UserFacingError::is_retryable),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::Io { .. } => Some("error.io"),
            Self::Internal(_) => Some("error.internal"),
            _ => self.inner().and_then(UserFacingError::user_code),
        }
    }
}

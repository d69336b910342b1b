//! Errors from the repository storage tree

use std::borrow::Cow;
use std::io;
use std::path::Path;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum StorageError {
    /// A database archive exists but could not be decoded.
    #[error("cannot decode database {path}: {message}")]
    ArchiveRead { path: String, message: String },

    #[error("{path} exists but is not a directory")]
    NotADirectory { path: String },

    #[error("access to {path} denied")]
    Denied { path: String },

    #[error("{path} does not exist")]
    Missing { path: String },

    /// Any other filesystem failure. `path` is empty when unknown.
    #[error("{path}: {message}")]
    Io { path: String, message: String },
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            path: String::new(),
            message: err.to_string(),
        }
    }
}

impl StorageError {
    /// Classify an `io::Error` raised while touching `path`
    #[must_use]
    pub fn from_io_with_path(err: &io::Error, path: &Path) -> Self {
        let path = path.display().to_string();
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::Denied { path },
            io::ErrorKind::NotFound => Self::Missing { path },
            _ => Self::Io {
                path,
                message: err.to_string(),
            },
        }
    }

    #[must_use]
    pub fn archive_read(path: &Path, message: impl ToString) -> Self {
        Self::ArchiveRead {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}

impl UserFacingError for StorageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ArchiveRead { .. } => Some("Re-add the repository's packages to rebuild the database."),
            Self::Denied { .. } => Some("Check the permissions of storage.path."),
            Self::NotADirectory { .. } => Some("Move the file out of the storage tree."),
            Self::Missing { .. } | Self::Io { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::ArchiveRead { .. } => "storage.archive_read",
            Self::NotADirectory { .. } => "storage.not_a_directory",
            Self::Denied { .. } => "storage.denied",
            Self::Missing { .. } => "storage.missing",
            Self::Io { .. } => "storage.io",
        })
    }
}

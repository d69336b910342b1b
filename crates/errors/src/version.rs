//! Version parsing error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum VersionError {
    #[error("invalid version {input}: {reason}")]
    InvalidVersion { input: String, reason: String },
}

impl UserFacingError for VersionError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        Some("Versions take the form [epoch:]pkgver-pkgrel, e.g. 1:2.4.1-3.")
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Self::InvalidVersion { .. } => Some("version.invalid_version"),
        }
    }
}

//! Configuration errors: the TOML file, the environment and `packages.yml`

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ConfigError {
    #[error("no configuration directory could be determined for this user")]
    NoConfigDir,

    #[error("cannot read {path}: {message}")]
    Unreadable { path: String, message: String },

    /// `document` names what was being parsed, a file path or `packages.yml`.
    #[error("malformed {document}: {message}")]
    Malformed { document: String, message: String },

    #[error("{field} cannot be {value:?}")]
    InvalidValue { field: String, value: String },
}

impl ConfigError {
    #[must_use]
    pub fn malformed(document: impl Into<String>, message: impl ToString) -> Self {
        Self::Malformed {
            document: document.into(),
            message: message.to_string(),
        }
    }
}

impl UserFacingError for ConfigError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoConfigDir => Some("Pass --config with an explicit path."),
            Self::Unreadable { .. } => Some("Check the path given to --config."),
            Self::Malformed { .. } | Self::InvalidValue { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NoConfigDir => "config.no_config_dir",
            Self::Unreadable { .. } => "config.unreadable",
            Self::Malformed { .. } => "config.malformed",
            Self::InvalidValue { .. } => "config.invalid_value",
        })
    }
}

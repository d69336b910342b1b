//! Package and naming error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PackageError {
    #[error("invalid package filename: {filename}")]
    InvalidFilename { filename: String },

    #[error("invalid repository name: {name}")]
    InvalidRepositoryName { name: String },

    #[error("invalid architecture: {arch}")]
    InvalidArch { arch: String },

    #[error("invalid dependency specification: {spec}")]
    InvalidDependency { spec: String },

    #[error("invalid package record: {message}")]
    InvalidRecord { message: String },
}

impl UserFacingError for PackageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidFilename { .. } => {
                Some("Package files are named <name>-[epoch:]<pkgver>-<pkgrel>-<arch>.pkg.tar.xz.")
            }
            Self::InvalidRepositoryName { .. } => Some(
                "Repository names use lowercase alphanumerics and @ . _ + -, and must not start with a hyphen.",
            ),
            Self::InvalidArch { .. } => Some("Supported architectures: x86_64, i686, aarch64, armv7h, any."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidFilename { .. } => "package.invalid_filename",
            Self::InvalidRepositoryName { .. } => "package.invalid_repository_name",
            Self::InvalidArch { .. } => "package.invalid_arch",
            Self::InvalidDependency { .. } => "package.invalid_dependency",
            Self::InvalidRecord { .. } => "package.invalid_record",
        };
        Some(code)
    }
}

//! Errors as the command line reports them

use std::fmt;

use pacsmith_errors::{Error, UserFacingError};

#[derive(Debug)]
pub enum CliError {
    /// Anything the library crates return
    Library(Error),
    UnknownRepository(String),
    PackageNotFound { package: String, location: String },
    InvalidArguments(String),
    /// Writing command output failed
    Output(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Library(e) => {
                f.write_str(&e.user_message())?;
                let details = [
                    ("code", e.user_code()),
                    ("hint", e.user_hint()),
                    ("retry", e.is_retryable().then_some("the operation may succeed later")),
                ];
                for (label, value) in details {
                    if let Some(value) = value {
                        write!(f, "\n  {label}: {value}")?;
                    }
                }
                Ok(())
            }
            CliError::UnknownRepository(repo) => {
                write!(f, "{repo} is not a registered repository; run `pacsmith init {repo}` first")
            }
            CliError::PackageNotFound { package, location } => {
                write!(f, "{package} is not in {location}")
            }
            CliError::InvalidArguments(msg) => write!(f, "invalid arguments: {msg}"),
            CliError::Output(e) => write!(f, "cannot write output: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Library(e) => Some(e),
            CliError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for CliError {
    fn from(e: Error) -> Self {
        CliError::Library(e)
    }
}

impl From<pacsmith_errors::VersionError> for CliError {
    fn from(e: pacsmith_errors::VersionError) -> Self {
        CliError::Library(e.into())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Output(e)
    }
}

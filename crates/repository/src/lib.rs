#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Archive index for hosted pacman repositories
//!
//! A repository keeps one metadata database and one file-listing database per
//! architecture next to the package files they describe. Databases are read
//! here directly and written through a [`DatabaseWriter`].

pub mod archive;
pub mod desc;
pub mod obsolete;
pub mod registry;
pub mod repository;
pub mod writer;

pub use obsolete::obsolete;
pub use registry::RepositoryRegistry;
pub use repository::Repository;
pub use writer::{DatabaseWriter, RepoTools, WriterOutput};

use pacsmith_errors::{Error, StorageError};
use std::path::Path;
use tokio::fs;

/// Make sure the storage root exists and is a directory
///
/// # Errors
///
/// Returns `StorageError::NotADirectory` if the path exists as something
/// else, or an I/O error if it cannot be created.
pub async fn prepare_storage(path: &Path) -> Result<(), Error> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(StorageError::NotADirectory {
            path: path.display().to_string(),
        }
        .into()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            fs::create_dir_all(path)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, path))?;
            Ok(())
        }
        Err(e) => Err(StorageError::from_io_with_path(&e, path).into()),
    }
}

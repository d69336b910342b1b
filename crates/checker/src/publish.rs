//! Landing uploaded packages

use crate::state::UpdateState;
use pacsmith_errors::{Error, PackageError};
use pacsmith_events::{CheckerEvent, EventEmitter, RepoEvent};
use pacsmith_repository::Repository;
use pacsmith_types::PackageFilename;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// What happened to each uploaded file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub added: Vec<PathBuf>,
    /// Files left untouched because the repository already has that
    /// version or a newer one
    pub rejected: Vec<PathBuf>,
}

fn file_name(path: &Path) -> Result<&str, Error> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            PackageError::InvalidFilename {
                filename: path.display().to_string(),
            }
            .into()
        })
}

/// Add uploaded package files to `repo` and clear their in-flight entries
///
/// Uploads that are not newer than what the repository holds are rejected
/// and stay where they are. Once the rest is indexed, the in-flight entry of
/// every published package name is cleared so the checker may request it
/// again.
///
/// # Errors
///
/// Returns an error if a filename is invalid or the repository fails to add
/// the files. Nothing is cleared in that case.
pub async fn publish(
    repo: &Repository,
    state: &UpdateState,
    files: &[PathBuf],
    events: &impl EventEmitter,
) -> Result<PublishReport, Error> {
    let mut report = PublishReport::default();
    let mut names = BTreeSet::new();

    for path in files {
        let filename = file_name(path)?;
        if !repo.is_new_filename(filename).await? {
            events.emit_repo(RepoEvent::PackageRejected {
                repo: repo.key().to_string(),
                filename: filename.to_string(),
                reason: "an equal or newer version is already published".to_string(),
            });
            report.rejected.push(path.clone());
            continue;
        }
        names.insert(PackageFilename::parse(filename)?.name);
        report.added.push(path.clone());
    }

    repo.add(&report.added).await?;

    for name in names {
        state.clear_pkg(&name, repo.key());
        events.emit_checker(CheckerEvent::StateCleared {
            repo: repo.key().to_string(),
            package: name,
        });
    }

    Ok(report)
}

//! The external database writer
//!
//! Databases are only ever rewritten by an external tool (pacman's
//! `repo-add`/`repo-remove`). The tool is not safe to run concurrently against
//! the same database; callers hold the architecture's write lock.

use async_trait::async_trait;
use pacsmith_errors::{Error, RepoError};
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Captured output of a successful writer invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterOutput {
    pub stdout: String,
    pub stderr: String,
}

impl WriterOutput {
    /// Entries the writer reported as removed, in output order
    ///
    /// Lines look like `  -> Removing existing entry 'zlib'...`; the writer
    /// reports bare names on removal and `name-version` on replacement.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry pattern fails to compile.
    pub fn removed_entries(&self) -> Result<Vec<String>, Error> {
        let re = Regex::new(r"Removing existing entry '([^']+)'")
            .map_err(|e| Error::internal(e.to_string()))?;
        Ok([&self.stdout, &self.stderr]
            .into_iter()
            .flat_map(|text| text.lines())
            .filter(|line| line.trim_start().starts_with("->"))
            .filter_map(|line| re.captures(line))
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect())
    }
}

/// Mutates database archives on behalf of a repository
#[async_trait]
pub trait DatabaseWriter: Send + Sync {
    /// Add or replace `packages` in `db`, removing superseded entries
    async fn rebuild(
        &self,
        db: &Path,
        workdir: &Path,
        packages: &[PathBuf],
    ) -> Result<WriterOutput, Error>;

    /// Remove the entries named `names` from `db`
    async fn remove(&self, db: &Path, workdir: &Path, names: &[String])
        -> Result<WriterOutput, Error>;
}

/// `repo-add` / `repo-remove` from pacman
#[derive(Debug, Clone)]
pub struct RepoTools {
    repo_add: PathBuf,
    repo_remove: PathBuf,
}

impl RepoTools {
    #[must_use]
    pub fn new(repo_add: impl Into<PathBuf>, repo_remove: impl Into<PathBuf>) -> Self {
        Self {
            repo_add: repo_add.into(),
            repo_remove: repo_remove.into(),
        }
    }

    async fn run(tool: &Path, workdir: &Path, args: Vec<String>) -> Result<WriterOutput, Error> {
        let tool_name = tool.display().to_string();
        let output = Command::new(tool)
            .args(&args)
            .current_dir(workdir)
            .output()
            .await
            .map_err(|e| RepoError::WriterUnavailable {
                tool: tool_name.clone(),
                message: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let mut diagnostics = stdout;
            if !stderr.is_empty() {
                if !diagnostics.is_empty() && !diagnostics.ends_with('\n') {
                    diagnostics.push('\n');
                }
                diagnostics.push_str(&stderr);
            }
            return Err(RepoError::WriterFailed {
                tool: tool_name,
                status: output.status.to_string(),
                output: diagnostics.trim_end().to_string(),
            }
            .into());
        }

        Ok(WriterOutput { stdout, stderr })
    }
}

impl Default for RepoTools {
    fn default() -> Self {
        Self::new("repo-add", "repo-remove")
    }
}

#[async_trait]
impl DatabaseWriter for RepoTools {
    async fn rebuild(
        &self,
        db: &Path,
        workdir: &Path,
        packages: &[PathBuf],
    ) -> Result<WriterOutput, Error> {
        let mut args = vec![
            "--nocolor".to_string(),
            "-R".to_string(),
            db.display().to_string(),
        ];
        args.extend(packages.iter().map(|p| p.display().to_string()));
        Self::run(&self.repo_add, workdir, args).await
    }

    async fn remove(
        &self,
        db: &Path,
        workdir: &Path,
        names: &[String],
    ) -> Result<WriterOutput, Error> {
        let mut args = vec!["--nocolor".to_string(), db.display().to_string()];
        args.extend(names.iter().cloned());
        Self::run(&self.repo_remove, workdir, args).await
    }
}

//! Structured logging integration for events
//!
//! Library crates never log on their own; they emit [`AppEvent`]s that end up
//! here and are turned into tracing records with structured fields.

use pacsmith_events::{AppEvent, CheckerEvent, EventLevel, RepoEvent};
use tracing::{debug, error, info, trace, warn};

/// Log an [`AppEvent`] through the tracing infrastructure
pub fn log_event_with_tracing(event: &AppEvent) {
    let meta = event.meta();
    let domain = event.log_target();

    match event {
        AppEvent::Checker(checker_event) => match checker_event {
            CheckerEvent::BuildTriggered { repo, message } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    repo = %repo,
                    commit = %message,
                    "Build requested"
                );
            }
            CheckerEvent::BuildTriggerFailed {
                repo,
                message,
                failure,
            } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    repo = %repo,
                    commit = %message,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    error = %failure.message,
                    "Build request failed"
                );
            }
            CheckerEvent::RepoFailed { repo, failure } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    repo = %repo,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    error = %failure.message,
                    hint = ?failure.hint,
                    "Repository check failed"
                );
            }
            CheckerEvent::RepoChecked {
                repo,
                triggered,
                last_check,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    repo = %repo,
                    triggered = triggered,
                    last_check = %last_check,
                    "Repository checked"
                );
            }
            CheckerEvent::SweepCompleted { checked, failed } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    checked = checked,
                    failed = failed,
                    "Update sweep completed"
                );
            }
            _ => log_by_level(event, domain),
        },

        AppEvent::Repo(repo_event) => match repo_event {
            RepoEvent::PackagesAdded { repo, arch, files } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    repo = %repo,
                    arch = %arch,
                    files = ?files,
                    "Packages added"
                );
            }
            RepoEvent::PackagesRemoved {
                repo,
                arch,
                names,
                deleted_files,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    repo = %repo,
                    arch = %arch,
                    names = ?names,
                    deleted = deleted_files.len(),
                    "Packages removed"
                );
            }
            RepoEvent::WriterFailed {
                repo,
                arch,
                failure,
            } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    repo = %repo,
                    arch = %arch,
                    code = ?failure.code,
                    error = %failure.message,
                    "Database writer failed"
                );
            }
            _ => log_by_level(event, domain),
        },

        AppEvent::General(_) | AppEvent::Resolver(_) => log_by_level(event, domain),
    }
}

fn log_by_level(event: &AppEvent, domain: &str) {
    let meta = event.meta();
    let fields = event.log_fields();
    match meta.level {
        EventLevel::Error => {
            error!(source = meta.source.as_str(), event_id = %meta.event_id, correlation = ?meta.correlation_id, domain, event = %fields, "Application event");
        }
        EventLevel::Warn => {
            warn!(source = meta.source.as_str(), event_id = %meta.event_id, correlation = ?meta.correlation_id, domain, event = %fields, "Application event");
        }
        EventLevel::Info => {
            info!(source = meta.source.as_str(), event_id = %meta.event_id, correlation = ?meta.correlation_id, domain, event = %fields, "Application event");
        }
        EventLevel::Debug => {
            debug!(source = meta.source.as_str(), event_id = %meta.event_id, correlation = ?meta.correlation_id, domain, event = %fields, "Application event");
        }
        EventLevel::Trace => {
            trace!(source = meta.source.as_str(), event_id = %meta.event_id, correlation = ?meta.correlation_id, domain, event = %fields, "Application event");
        }
    }
}

#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in pacsmith
//!
//! Library crates never print or log directly. They emit domain events over
//! an unbounded channel and the binary forwards them to `tracing`.
//!
//! ## Architecture
//!
//! - **Domain events**: grouped by subsystem (Repo, Resolver, Checker, General)
//! - **Unified `EventEmitter` trait**: one API whether you hold a raw sender or
//!   a struct that optionally carries one
//! - **Tracing integration**: every event knows its log level and target

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{
    AppEvent, CheckerEvent, FailureContext, GeneralEvent, RepoEvent, ResolverEvent,
};

use pacsmith_errors::UserFacingError;
use tokio::sync::mpsc::UnboundedSender;

/// Type alias for event sender
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout pacsmith
///
/// Implementors only provide [`EventEmitter::event_sender`]; emitting without
/// a sender is a no-op so components work the same with events disabled.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // a dropped receiver only means nobody is listening
            let _ = sender.send(event);
        }
    }

    /// Emit a warning, optionally with the repository or item it concerns
    fn emit_warning(&self, message: impl Into<String>, context: Option<String>) {
        self.emit(AppEvent::General(GeneralEvent::Warning {
            message: message.into(),
            context,
        }));
    }

    /// Emit an operation failed event from a user-facing error
    fn emit_operation_failed<E: UserFacingError + ?Sized>(
        &self,
        operation: impl Into<String>,
        error: &E,
    ) {
        self.emit(AppEvent::General(GeneralEvent::OperationFailed {
            operation: operation.into(),
            failure: FailureContext::from_error(error),
        }));
    }

    /// Emit a repository event
    fn emit_repo(&self, event: RepoEvent) {
        self.emit(AppEvent::Repo(event));
    }

    /// Emit a resolver event
    fn emit_resolver(&self, event: ResolverEvent) {
        self.emit(AppEvent::Resolver(event));
    }

    /// Emit a checker event
    fn emit_checker(&self, event: CheckerEvent) {
        self.emit(AppEvent::Checker(event));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
/// This allows `EventSender` to be used directly where `EventEmitter` is expected
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}

impl EventEmitter for Option<EventSender> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.as_ref()
    }
}

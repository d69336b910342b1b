#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Update checking for hosted repositories
//!
//! The [`Checker`] periodically resolves each repository's tracked packages
//! and sends one build request per batch of connected packages. The
//! [`UpdateState`] remembers which requests are still in flight so the same
//! package is not requested twice; [`publish`] clears an entry once the
//! rebuilt package lands.

mod checker;
mod publish;
mod remote;
mod state;
mod store;

pub use checker::{BatchKind, Checker, SweepSummary};
pub use publish::{publish, PublishReport};
pub use remote::{HttpRemote, Remote};
pub use state::UpdateState;
pub use store::{FileRepoStore, RepoStore};

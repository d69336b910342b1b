#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Dependency resolution for pacsmith
//!
//! Tracked packages are looked up upstream together with everything they
//! depend on. The resulting graph is split into connected groups, and each
//! group is checked against the hosted repository to find what needs a
//! build request.

mod graph;
mod resolver;
mod upstream;

pub use graph::{DependencyGraph, Node, NodeId};
pub use resolver::{PackageIndex, UpdateGroup, UpdateResolver};
pub use upstream::{AurClient, UpstreamPackage, UpstreamSource};

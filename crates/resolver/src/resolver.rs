//! Update detection for a repository's tracked packages

use crate::graph::DependencyGraph;
use crate::upstream::UpstreamSource;
use async_trait::async_trait;
use pacsmith_errors::Error;
use pacsmith_events::{EventEmitter, EventSender, FailureContext, ResolverEvent};
use pacsmith_repository::Repository;
use pacsmith_types::{is_devel, Arch, Version};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What the resolver needs to know about the hosted repository
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Whether `version` of `name` is absent or newer than what is hosted
    /// for any applicable architecture
    async fn is_new(&self, name: &str, version: &Version) -> Result<bool, Error>;
}

#[async_trait]
impl PackageIndex for Repository {
    async fn is_new(&self, name: &str, version: &Version) -> Result<bool, Error> {
        Repository::is_new(self, name, Arch::Any, version).await
    }
}

/// One batch of connected packages
///
/// `updates` have a newer upstream version; `rechecks` are devel packages
/// whose declared version is unchanged but whose source may have moved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateGroup {
    pub updates: Vec<String>,
    pub rechecks: Vec<String>,
}

impl UpdateGroup {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.rechecks.is_empty()
    }
}

/// Resolves tracked packages into update batches
pub struct UpdateResolver {
    source: Arc<dyn UpstreamSource>,
    event_sender: Option<EventSender>,
}

impl EventEmitter for UpdateResolver {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl UpdateResolver {
    #[must_use]
    pub fn new(source: Arc<dyn UpstreamSource>) -> Self {
        Self {
            source,
            event_sender: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Discover the dependency graph of `roots` and classify every package
    ///
    /// Only non-empty groups are returned. `repo` labels events.
    ///
    /// # Errors
    ///
    /// Any upstream, version or index failure aborts the whole resolution.
    pub async fn resolve(
        &self,
        repo: &str,
        roots: &[String],
        index: &dyn PackageIndex,
    ) -> Result<Vec<UpdateGroup>, Error> {
        self.emit_resolver(ResolverEvent::ResolutionStarted {
            repo: repo.to_string(),
            roots: roots.to_vec(),
        });

        match self.resolve_inner(roots, index).await {
            Ok((nodes, groups)) => {
                self.emit_resolver(ResolverEvent::ResolutionCompleted {
                    repo: repo.to_string(),
                    nodes,
                    groups: groups.len(),
                    updates: groups.iter().map(|g| g.updates.len()).sum(),
                    rechecks: groups.iter().map(|g| g.rechecks.len()).sum(),
                });
                Ok(groups)
            }
            Err(err) => {
                self.emit_resolver(ResolverEvent::ResolutionFailed {
                    repo: repo.to_string(),
                    failure: FailureContext::from_error(&err),
                });
                Err(err)
            }
        }
    }

    async fn resolve_inner(
        &self,
        roots: &[String],
        index: &dyn PackageIndex,
    ) -> Result<(usize, Vec<UpdateGroup>), Error> {
        let graph = DependencyGraph::discover(self.source.as_ref(), roots, &self.event_sender).await?;

        let mut result = Vec::new();
        for members in graph.groups() {
            let mut group = UpdateGroup::default();
            for id in members {
                let node = graph.node(id);
                let version = Version::parse(&node.version)?;
                if index.is_new(&node.name, &version).await? {
                    group.updates.push(node.name.clone());
                } else if is_devel(&node.name) {
                    group.rechecks.push(node.name.clone());
                }
            }
            if !group.is_empty() {
                result.push(group);
            }
        }

        Ok((graph.len(), result))
    }
}

//! Upstream dependency graph
//!
//! Discovery and grouping are separate passes: [`DependencyGraph::discover`]
//! walks the upstream source breadth first and produces an immutable arena,
//! [`DependencyGraph::groups`] partitions it without touching it.

use crate::upstream::{UpstreamPackage, UpstreamSource};
use pacsmith_errors::Error;
use pacsmith_events::{EventEmitter, ResolverEvent};
use pacsmith_types::DepSpec;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Index of a node in the arena
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub version: String,
    /// Prerequisites of this package
    pub depends_on: Vec<NodeId>,
    /// Packages requiring this one
    pub required_by: Vec<NodeId>,
}

/// Immutable dependency graph of the tracked packages
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
}

/// Bare names of the runtime and build dependencies of `pkg`
fn dependency_names(pkg: &UpstreamPackage) -> Result<Vec<String>, Error> {
    pkg.depends
        .iter()
        .chain(&pkg.makedepends)
        .map(|spec| DepSpec::parse(spec).map(|dep| dep.name).map_err(Error::from))
        .collect()
}

impl DependencyGraph {
    /// Query `roots` and, recursively, every dependency name upstream knows
    ///
    /// Each round sends every not yet visited name in one query. Names the
    /// source does not know (packages provided elsewhere) end the walk on
    /// that path and get no node.
    ///
    /// # Errors
    ///
    /// Returns the first query failure or malformed dependency specifier.
    pub async fn discover(
        source: &dyn UpstreamSource,
        roots: &[String],
        events: &impl EventEmitter,
    ) -> Result<Self, Error> {
        let mut found: Vec<(UpstreamPackage, Vec<String>)> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut pending: Vec<String> = roots
            .iter()
            .filter(|name| visited.insert((*name).clone()))
            .cloned()
            .collect();
        let mut first_round = true;

        while !pending.is_empty() {
            let results = source.query(&pending).await?;
            events.emit_resolver(ResolverEvent::UpstreamQueried {
                requested: pending.len(),
                found: results.len(),
            });

            if first_round {
                let known: HashSet<&str> = results.iter().map(|p| p.name.as_str()).collect();
                let missing: Vec<String> = pending
                    .iter()
                    .filter(|name| !known.contains(name.as_str()))
                    .cloned()
                    .collect();
                if !missing.is_empty() {
                    events.emit_resolver(ResolverEvent::PackagesNotFound { names: missing });
                }
                first_round = false;
            }

            let mut next = Vec::new();
            for pkg in results {
                let deps = dependency_names(&pkg)?;
                for dep in &deps {
                    if visited.insert(dep.clone()) {
                        next.push(dep.clone());
                    }
                }
                // a source may echo a name it was not asked for
                visited.insert(pkg.name.clone());
                found.push((pkg, deps));
            }
            pending = next;
        }

        Ok(Self::from_packages(found))
    }

    /// Build the arena from packages and their bare dependency names
    ///
    /// Dependencies without a package of their own are dropped. A repeated
    /// name keeps its first record.
    #[must_use]
    pub fn from_packages(packages: Vec<(UpstreamPackage, Vec<String>)>) -> Self {
        let mut graph = Self::default();
        let mut pending_edges = Vec::new();

        for (pkg, deps) in packages {
            if graph.index.contains_key(&pkg.name) {
                continue;
            }
            let id = graph.nodes.len();
            graph.index.insert(pkg.name.clone(), id);
            graph.nodes.push(Node {
                name: pkg.name,
                version: pkg.version,
                depends_on: Vec::new(),
                required_by: Vec::new(),
            });
            pending_edges.push((id, deps));
        }

        for (id, deps) in pending_edges {
            let targets: BTreeSet<NodeId> = deps
                .iter()
                .filter_map(|dep| graph.index.get(dep).copied())
                .filter(|dep| *dep != id)
                .collect();
            for dep in targets {
                graph.nodes[id].depends_on.push(dep);
                graph.nodes[dep].required_by.push(id);
            }
        }

        graph
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|id| &self.nodes[*id])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Partition the graph into connected groups
    ///
    /// Packages sharing a direct or transitive dependency end up together.
    /// Each group lists node ids ordered by name; groups are ordered by
    /// their first name.
    #[must_use]
    pub fn groups(&self) -> Vec<Vec<NodeId>> {
        let mut sets = DisjointSets::new(self.nodes.len());
        for (id, node) in self.nodes.iter().enumerate() {
            for dep in &node.depends_on {
                sets.union(id, *dep);
            }
        }

        let mut by_root: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for id in 0..self.nodes.len() {
            by_root.entry(sets.find(id)).or_default().push(id);
        }

        let mut groups: Vec<Vec<NodeId>> = by_root.into_values().collect();
        for group in &mut groups {
            group.sort_by(|a, b| self.nodes[*a].name.cmp(&self.nodes[*b].name));
        }
        groups.sort_by(|a, b| self.nodes[a[0]].name.cmp(&self.nodes[b[0]].name));
        groups
    }
}

/// Union-find with path halving and union by size
struct DisjointSets {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSets {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
    }
}

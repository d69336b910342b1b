//! Obsolete package detection

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Candidates that are neither a root nor a transitive runtime dependency of one
///
/// `deps` maps a package name to the bare names of its runtime dependencies.
/// Names reachable from `roots` through `deps` are retained, every other
/// candidate is obsolete. The result is sorted.
#[must_use]
pub fn obsolete<'a, C, R>(candidates: C, roots: R, deps: &HashMap<String, Vec<String>>) -> Vec<String>
where
    C: IntoIterator<Item = &'a str>,
    R: IntoIterator<Item = &'a str>,
{
    let mut retained: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for root in roots {
        if retained.insert(root) {
            queue.push_back(root);
        }
    }

    while let Some(name) = queue.pop_front() {
        for dep in deps.get(name).into_iter().flatten() {
            if retained.insert(dep.as_str()) {
                queue.push_back(dep.as_str());
            }
        }
    }

    let obsolete: BTreeSet<&str> = candidates
        .into_iter()
        .filter(|name| !retained.contains(name))
        .collect();

    obsolete.into_iter().map(str::to_string).collect()
}

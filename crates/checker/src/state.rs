//! In-flight build request table

use chrono::{DateTime, Duration, Utc};
use pacsmith_types::RepoKey;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Table = HashMap<RepoKey, HashMap<String, DateTime<Utc>>>;

/// Packages with a recent update or check request, per repository
///
/// An entry is active for `ttl` after it was recorded. Expired entries stay
/// in the table, inactive, until [`UpdateState::clear_expired`] runs.
#[derive(Debug)]
pub struct UpdateState {
    table: RwLock<Table>,
    ttl: Duration,
}

impl UpdateState {
    #[must_use]
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
        }
    }

    /// Record a request for `pkg`, refreshing an existing entry
    pub fn add(&self, pkg: &str, repo: &RepoKey) {
        self.add_at(pkg, repo, Utc::now());
    }

    pub fn add_at(&self, pkg: &str, repo: &RepoKey, now: DateTime<Utc>) {
        self.write()
            .entry(repo.clone())
            .or_default()
            .insert(pkg.to_string(), now);
    }

    /// Whether a request for `pkg` is still in flight, with the time it was
    /// recorded if there is an entry at all
    #[must_use]
    pub fn is_active(&self, pkg: &str, repo: &RepoKey) -> (bool, Option<DateTime<Utc>>) {
        self.is_active_at(pkg, repo, Utc::now())
    }

    #[must_use]
    pub fn is_active_at(
        &self,
        pkg: &str,
        repo: &RepoKey,
        now: DateTime<Utc>,
    ) -> (bool, Option<DateTime<Utc>>) {
        match self.read().get(repo).and_then(|pkgs| pkgs.get(pkg)) {
            Some(recorded) => (self.live(*recorded, now), Some(*recorded)),
            None => (false, None),
        }
    }

    /// Forget `pkg`; absent entries are ignored
    pub fn clear_pkg(&self, pkg: &str, repo: &RepoKey) {
        let mut table = self.write();
        if let Some(pkgs) = table.get_mut(repo) {
            pkgs.remove(pkg);
            if pkgs.is_empty() {
                table.remove(repo);
            }
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn clear_expired(&self) -> usize {
        self.clear_expired_at(Utc::now())
    }

    pub fn clear_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.write().retain(|_, pkgs| {
            let before = pkgs.len();
            pkgs.retain(|_, recorded| self.live(*recorded, now));
            removed += before - pkgs.len();
            !pkgs.is_empty()
        });
        removed
    }

    /// Number of recorded entries, expired ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // every mutation leaves the table consistent, so a panic elsewhere while
    // the lock was held does not invalidate it
    fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.table.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn live(&self, recorded: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        recorded
            .checked_add_signed(self.ttl)
            .is_none_or(|expires| expires > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> RepoKey {
        RepoKey::new("o", "r")
    }

    #[test]
    fn test_active_within_ttl() {
        let state = UpdateState::new(std::time::Duration::from_secs(60));
        let t0 = Utc::now();
        state.add_at("x", &key(), t0);

        assert_eq!(state.is_active_at("x", &key(), t0), (true, Some(t0)));
        assert!(state.is_active_at("x", &key(), t0 + Duration::seconds(59)).0);
        assert_eq!(
            state.is_active_at("x", &key(), t0 + Duration::seconds(60)),
            (false, Some(t0))
        );
        assert_eq!(state.is_active_at("y", &key(), t0), (false, None));
        assert_eq!(
            state.is_active_at("x", &RepoKey::new("o", "other"), t0),
            (false, None)
        );
    }

    #[test]
    fn test_add_refreshes() {
        let state = UpdateState::new(std::time::Duration::from_secs(60));
        let t0 = Utc::now();
        state.add_at("x", &key(), t0);
        state.add_at("x", &key(), t0 + Duration::seconds(50));
        assert!(state.is_active_at("x", &key(), t0 + Duration::seconds(100)).0);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_clear_expired_keeps_active_entries() {
        let state = UpdateState::new(std::time::Duration::from_secs(60));
        let t0 = Utc::now();
        state.add_at("old", &key(), t0);
        state.add_at("fresh", &key(), t0 + Duration::seconds(30));
        state.add_at("gone", &RepoKey::new("o", "other"), t0);

        assert_eq!(state.clear_expired_at(t0 + Duration::seconds(61)), 2);
        assert_eq!(state.len(), 1);
        assert!(state.is_active_at("fresh", &key(), t0 + Duration::seconds(61)).0);
        assert_eq!(state.clear_expired_at(t0 + Duration::seconds(61)), 0);
    }

    #[test]
    fn test_clear_pkg() {
        let state = UpdateState::new(std::time::Duration::from_secs(60));
        state.clear_pkg("absent", &key());
        state.add("x", &key());
        state.clear_pkg("x", &key());
        assert!(state.is_empty());
        assert_eq!(state.is_active("x", &key()), (false, None));
    }

    #[test]
    fn test_poisoned_table_keeps_working() {
        let state = std::sync::Arc::new(UpdateState::new(std::time::Duration::from_secs(60)));
        state.add("x", &key());

        let holder = state.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.table.write().unwrap();
            panic!("writer died holding the table");
        })
        .join();
        assert!(state.table.is_poisoned());

        assert!(state.is_active("x", &key()).0);
        state.add("y", &key());
        assert_eq!(state.len(), 2);
        state.clear_pkg("x", &key());
        assert_eq!(state.clear_expired(), 0);
        assert!(!state.is_active("x", &key()).0);
        assert!(state.is_active("y", &key()).0);
    }
}

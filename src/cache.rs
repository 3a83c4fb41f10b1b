//! In-memory memoization in front of every remote lookup.
//!
//! Keys are plain strings built by the engine with a per-lookup prefix
//! (`issue:`, `versions:`, ...). Entries never expire unless stored with a
//! TTL. Expired entries are hidden at once and dropped on the next write;
//! `flush_all` is the only other invalidation.
//!
//! During a batch lookup every write goes to a key unique to its item and
//! storing the same value twice is harmless, so fan-out results can be
//! written back in any order.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::issue::IssueRecord;
use crate::ports::clock::Clock;
use crate::ports::issues::Version;
use crate::ports::vcs::RepoHandle;

/// Values the engine memoizes.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// A resolved repository.
    Repository(RepoHandle),
    /// Issue keys credited between two refs, in first-seen order.
    IssueKeys(Vec<String>),
    /// One normalized issue.
    Issue(IssueRecord),
    /// Active versions of a project.
    Versions(Vec<Version>),
    /// Normalized issues of one version.
    Issues(Vec<IssueRecord>),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedValue,
    expires_at: Option<DateTime<Utc>>,
}

/// Key/value store with optional per-entry expiry.
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
    clock: Box<dyn Clock>,
}

impl CacheStore {
    /// Creates an empty store reading time from `clock`.
    #[must_use]
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self { entries: HashMap::new(), clock }
    }

    /// Whether a live entry exists for `key`.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the live value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CachedValue> {
        let entry = self.entries.get(key)?;
        match entry.expires_at {
            Some(expires_at) if self.clock.now() >= expires_at => None,
            _ => Some(&entry.value),
        }
    }

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// Expired entries are dropped first.
    pub fn set(&mut self, key: impl Into<String>, value: CachedValue, ttl: Option<Duration>) {
        let now = self.clock.now();
        self.entries.retain(|_, entry| !entry.expires_at.is_some_and(|at| now >= at));

        let expires_at = ttl.and_then(|ttl| chrono::Duration::from_std(ttl).ok().map(|ttl| now + ttl));
        self.entries.insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Drops every entry.
    pub fn flush_all(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet dropped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ManualClock;

    fn keys(list: &[&str]) -> CachedValue {
        CachedValue::IssueKeys(list.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn set_then_get_without_ttl_never_expires() {
        let clock = ManualClock::new();
        let mut cache = CacheStore::new(Box::new(clock.clone()));
        cache.set("credits:v1...v2", keys(&["ABC-1"]), None);

        clock.advance(Duration::from_secs(86_400 * 365));
        assert!(cache.has("credits:v1...v2"));
        assert_eq!(cache.get("credits:v1...v2"), Some(&keys(&["ABC-1"])));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let clock = ManualClock::new();
        let mut cache = CacheStore::new(Box::new(clock.clone()));
        cache.set("versions:ABC", CachedValue::Versions(Vec::new()), Some(Duration::from_secs(60)));

        clock.advance(Duration::from_secs(59));
        assert!(cache.has("versions:ABC"));

        clock.advance(Duration::from_secs(1));
        assert!(!cache.has("versions:ABC"));
        assert!(cache.get("versions:ABC").is_none());
    }

    #[test]
    fn missing_key_is_absent() {
        let cache = CacheStore::new(Box::new(ManualClock::new()));
        assert!(!cache.has("issue:ABC-1"));
        assert!(cache.is_empty());
    }

    #[test]
    fn flush_all_clears_everything() {
        let mut cache = CacheStore::new(Box::new(ManualClock::new()));
        cache.set("a", keys(&[]), None);
        cache.set("b", keys(&[]), Some(Duration::from_secs(5)));
        assert_eq!(cache.len(), 2);

        cache.flush_all();
        assert!(cache.is_empty());
        assert!(!cache.has("a"));
    }

    #[test]
    fn set_drops_expired_entries() {
        let clock = ManualClock::new();
        let mut cache = CacheStore::new(Box::new(clock.clone()));
        cache.set("issue:ABC-1", keys(&[]), Some(Duration::from_secs(10)));
        cache.set("issue:ABC-2", keys(&[]), Some(Duration::from_secs(100)));
        cache.set("repo:acme/widgets", keys(&[]), None);

        clock.advance(Duration::from_secs(30));
        cache.set("issue:ABC-3", keys(&[]), Some(Duration::from_secs(10)));
        assert_eq!(cache.len(), 3);
        assert!(!cache.has("issue:ABC-1"));
        assert!(cache.has("issue:ABC-2"));
        assert!(cache.has("repo:acme/widgets"));
    }

    #[test]
    fn set_replaces_previous_value() {
        let mut cache = CacheStore::new(Box::new(ManualClock::new()));
        cache.set("k", keys(&["ABC-1"]), None);
        cache.set("k", keys(&["ABC-2"]), None);
        assert_eq!(cache.get("k"), Some(&keys(&["ABC-2"])));
        assert_eq!(cache.len(), 1);
    }
}

//! Cache Store Module
//!
//! The entry map shared by every policy and the unbounded Basic cache built on it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::cache::{Cache, CacheEntry, CacheValue};
use crate::config::PolicyKind;

// == Entry Map ==
/// Key to entry storage with lazy expiry.
///
/// Not synchronized on its own: each policy wraps it in the lock that also
/// guards its side-structures.
#[derive(Debug, Default)]
pub struct EntryMap {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Expiry used when `insert` gets no TTL
    default_expiry: Option<Duration>,
}

impl EntryMap {
    // == Constructor ==
    /// Creates an empty map with room for `capacity` entries.
    pub fn new(capacity: usize, default_expiry: Option<Duration>) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            default_expiry,
        }
    }

    // == Get Live ==
    /// Returns the entry only if it is present and not expired.
    ///
    /// Expired entries stay in the map; purging is left to `remove`, eviction
    /// or a sweep.
    pub fn get_live(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key).filter(|entry| !entry.is_expired())
    }

    // == Insert ==
    /// Inserts or fully replaces the entry for `key`.
    ///
    /// Returns true if an entry was replaced.
    pub fn insert(&mut self, key: &str, value: CacheValue, ttl: Option<Duration>) -> bool {
        let entry = CacheEntry::new(value, ttl.or(self.default_expiry));
        self.entries.insert(key.to_string(), entry).is_some()
    }

    /// Physical presence, expired or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.entries.remove(key)
    }

    // == Purge Expired ==
    /// Removes every entry expired as of `now` and returns their keys.
    pub fn purge_expired(&mut self, now: Instant) -> Vec<String> {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
        }

        expired
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Basic Cache ==
/// Unbounded cache with expiry checked on read.
#[derive(Debug)]
pub struct BasicCache {
    entries: RwLock<EntryMap>,
}

impl BasicCache {
    /// Creates a new BasicCache.
    ///
    /// # Arguments
    /// * `capacity` - Initial capacity of the entry map (not a bound)
    /// * `default_expiry` - Expiry for entries stored without a TTL
    pub fn new(capacity: usize, default_expiry: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(EntryMap::new(capacity, default_expiry)),
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.entries.write().purge_expired(Instant::now()).len()
    }
}

impl Cache for BasicCache {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Basic
    }

    fn get(&self, key: &str) -> Option<CacheValue> {
        self.entries
            .read()
            .get_live(key)
            .map(|entry| Arc::clone(&entry.value))
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) {
        self.entries.write().insert(key, value, ttl);
    }

    fn exists(&self, key: &str) -> bool {
        self.entries.read().get_live(key).is_some()
    }

    fn remove(&self, key: &str) {
        self.entries.write().remove(key);
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

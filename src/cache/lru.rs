//! LRU Module
//!
//! Least Recently Used tracking and the bounded LRU cache built on it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{Cache, CacheValue, EntryMap};
use crate::config::PolicyKind;
use crate::error::{CacheError, Result};

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Every touch stamps the key with a fresh tick. The lowest tick is the least
/// recently used key, the highest the most recently used one.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Keys ordered by last touch, oldest first
    order: BTreeMap<u64, String>,
    /// Last touch tick per key
    ticks: HashMap<String, u64>,
    next_tick: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, tracking it if new.
    pub fn touch(&mut self, key: &str) {
        let tick = self.next_tick;
        self.next_tick += 1;

        match self.ticks.get_mut(key) {
            Some(previous) => {
                self.order.remove(&*previous);
                *previous = tick;
            }
            None => {
                self.ticks.insert(key.to_string(), tick);
            }
        }
        self.order.insert(tick, key.to_string());
    }

    // == Remove ==
    /// Stops tracking a key. Returns true if it was tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.ticks.remove(key) {
            Some(tick) => {
                self.order.remove(&tick);
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    #[cfg(test)]
    pub(crate) fn peek_oldest(&self) -> Option<&str> {
        self.order.values().next().map(String::as_str)
    }

    /// Keys from least to most recently used.
    #[cfg(test)]
    pub(crate) fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ticks.contains_key(key)
    }
}

// == LRU Cache ==
#[derive(Debug)]
struct LruState {
    entries: EntryMap,
    tracker: LruTracker,
}

/// Bounded cache evicting the least recently used key.
///
/// Store and recency order share one lock, so check-capacity, evict and
/// insert happen as a unit.
#[derive(Debug)]
pub struct LruCache {
    state: Mutex<LruState>,
    max_capacity: usize,
}

impl LruCache {
    /// Creates a new LruCache.
    ///
    /// # Arguments
    /// * `capacity` - Initial capacity of the entry map
    /// * `max_capacity` - Maximum number of keys held at once
    /// * `default_expiry` - Expiry for entries stored without a TTL
    pub fn new(
        capacity: usize,
        max_capacity: usize,
        default_expiry: Option<Duration>,
    ) -> Result<Self> {
        if max_capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "LRU cache requires a max capacity greater than zero".to_string(),
            ));
        }

        Ok(Self {
            state: Mutex::new(LruState {
                entries: EntryMap::new(capacity.min(max_capacity), default_expiry),
                tracker: LruTracker::new(),
            }),
            max_capacity,
        })
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    #[cfg(test)]
    pub(crate) fn assert_lockstep(&self) {
        let state = self.state.lock();
        assert_eq!(state.entries.len(), state.tracker.len());
        for key in state.entries.keys() {
            assert!(state.tracker.contains(key), "untracked key {key}");
        }
    }
}

impl Cache for LruCache {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Lru
    }

    fn get(&self, key: &str) -> Option<CacheValue> {
        let mut state = self.state.lock();
        let value = state
            .entries
            .get_live(key)
            .map(|entry| Arc::clone(&entry.value))?;
        state.tracker.touch(key);
        Some(value)
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) {
        let mut state = self.state.lock();

        // If not overwriting and at capacity, evict oldest entry
        if !state.entries.contains_key(key) && state.entries.len() >= self.max_capacity {
            if let Some(evicted) = state.tracker.evict_oldest() {
                state.entries.remove(&evicted);
                debug!(key = %evicted, "LRU eviction");
            }
        }

        state.entries.insert(key, value, ttl);
        state.tracker.touch(key);
    }

    fn exists(&self, key: &str) -> bool {
        self.state.lock().entries.get_live(key).is_some()
    }

    fn remove(&self, key: &str) {
        let mut state = self.state.lock();
        if state.entries.remove(key).is_some() {
            state.tracker.remove(key);
        }
    }

    fn len(&self) -> usize {
        self.state.lock().entries.len()
    }
}

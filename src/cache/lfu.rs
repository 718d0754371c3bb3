//! LFU Module
//!
//! Least Frequently Used tracking and the bounded LFU cache built on it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{Cache, CacheValue, EntryMap};
use crate::config::PolicyKind;
use crate::error::{CacheError, Result};

#[derive(Debug, Clone, Copy)]
struct Usage {
    frequency: u64,
    tick: u64,
}

// == LFU Tracker ==
/// Tracks access counts for LFU eviction strategy.
///
/// Keys are indexed by `(frequency, last touch tick)`: the first key in that
/// order has the lowest count and, among equal counts, the oldest touch.
#[derive(Debug, Default)]
pub struct LfuTracker {
    order: BTreeMap<(u64, u64), String>,
    usage: HashMap<String, Usage>,
    next_tick: u64,
}

impl LfuTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Counts one access for `key` and marks it most recently touched.
    ///
    /// Returns the key's new access count.
    pub fn touch(&mut self, key: &str) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;

        let frequency = match self.usage.get_mut(key) {
            Some(usage) => {
                self.order.remove(&(usage.frequency, usage.tick));
                usage.frequency += 1;
                usage.tick = tick;
                usage.frequency
            }
            None => {
                self.usage
                    .insert(key.to_string(), Usage { frequency: 1, tick });
                1
            }
        };
        self.order.insert((frequency, tick), key.to_string());
        frequency
    }

    /// Stops tracking a key. Returns true if it was tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.usage.remove(key) {
            Some(usage) => {
                self.order.remove(&(usage.frequency, usage.tick));
                true
            }
            None => false,
        }
    }

    // == Evict ==
    /// Returns and removes the eviction victim: lowest count, then least recent.
    pub fn evict(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.usage.remove(&key);
        Some(key)
    }

    #[cfg(test)]
    pub(crate) fn peek_victim(&self) -> Option<&str> {
        self.order.values().next().map(String::as_str)
    }

    pub fn frequency(&self, key: &str) -> Option<u64> {
        self.usage.get(key).map(|usage| usage.frequency)
    }

    pub fn len(&self) -> usize {
        self.usage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usage.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.usage.contains_key(key)
    }
}

// == LFU Cache ==
#[derive(Debug)]
struct LfuState {
    entries: EntryMap,
    tracker: LfuTracker,
}

/// Bounded cache evicting the least frequently used key.
///
/// Both `get` hits and `set` count as an access.
#[derive(Debug)]
pub struct LfuCache {
    state: Mutex<LfuState>,
    max_capacity: usize,
}

impl LfuCache {
    pub fn new(
        capacity: usize,
        max_capacity: usize,
        default_expiry: Option<Duration>,
    ) -> Result<Self> {
        if max_capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "LFU cache requires a max capacity greater than zero".to_string(),
            ));
        }

        Ok(Self {
            state: Mutex::new(LfuState {
                entries: EntryMap::new(capacity.min(max_capacity), default_expiry),
                tracker: LfuTracker::new(),
            }),
            max_capacity,
        })
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Current access count of a key, None if not stored.
    pub fn frequency(&self, key: &str) -> Option<u64> {
        self.state.lock().tracker.frequency(key)
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

impl Cache for LfuCache {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Lfu
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

        if !state.entries.contains_key(key) && state.entries.len() >= self.max_capacity {
            if let Some(evicted) = state.tracker.evict() {
                state.entries.remove(&evicted);
                debug!(key = %evicted, "LFU eviction");
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

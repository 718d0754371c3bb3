//! TTL Cache Module
//!
//! Unbounded cache purged by a background sweeper.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{BasicCache, Cache, CacheValue};
use crate::config::PolicyKind;
use crate::error::Result;
use crate::tasks::Sweeper;

// == TTL Cache ==
/// Basic cache plus a sweeper that physically removes expired entries.
///
/// Reads still check expiry themselves, so an entry that expired between two
/// sweeps is already a miss.
#[derive(Debug)]
pub struct TtlCache {
    store: Arc<BasicCache>,
    sweeper: Sweeper,
}

impl TtlCache {
    /// Creates a new TtlCache and starts its sweeper.
    ///
    /// # Arguments
    /// * `capacity` - Initial capacity of the entry map
    /// * `default_expiry` - Expiry for entries stored without a TTL
    /// * `sweep_interval` - Period between sweeps
    pub fn new(
        capacity: usize,
        default_expiry: Option<Duration>,
        sweep_interval: Duration,
    ) -> Result<Self> {
        let store = Arc::new(BasicCache::new(capacity, default_expiry));
        let swept = Arc::clone(&store);
        let sweeper = Sweeper::spawn(sweep_interval, move || swept.purge_expired())?;

        Ok(Self { store, sweeper })
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweeper.interval()
    }

    /// True until [`close`](Cache::close) has been called.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.is_running()
    }
}

impl Cache for TtlCache {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Ttl
    }

    fn get(&self, key: &str) -> Option<CacheValue> {
        self.store.get(key)
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) {
        self.store.set(key, value, ttl);
    }

    fn exists(&self, key: &str) -> bool {
        self.store.exists(key)
    }

    fn remove(&self, key: &str) {
        self.store.remove(key);
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn close(&self) {
        self.sweeper.stop();
    }

    fn is_active(&self) -> bool {
        self.sweeper.is_running()
    }
}

//! Cache Module
//!
//! Provides in-memory caches with interchangeable eviction/expiry policies.
//!
//! # Policies
//! - Basic: unbounded, expiry checked on read
//! - LRU: bounded, evicts the least recently used key
//! - LFU: bounded, evicts the least frequently used key, ties by recency
//! - TTL: unbounded, expired entries purged by a background sweeper

mod entry;
mod handle;
mod lfu;
mod lru;
mod store;
mod ttl;

#[cfg(test)]
mod property_tests;

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::PolicyKind;

// Re-export public types
pub use entry::CacheEntry;
pub use handle::CacheHandle;
pub use lfu::{LfuCache, LfuTracker};
pub use lru::{LruCache, LruTracker};
pub use store::{BasicCache, EntryMap};
pub use ttl::TtlCache;

/// Opaque payload stored in a cache. Typed reads downcast it.
pub type CacheValue = Arc<dyn Any + Send + Sync>;

// == Cache Trait ==
/// Operations every policy provides.
///
/// Implementations are internally synchronized; all methods take `&self` and
/// may be called from any number of threads.
pub trait Cache: Send + Sync + fmt::Debug {
    /// Policy this instance runs
    fn kind(&self) -> PolicyKind;

    /// Returns the payload if `key` is present and not expired.
    fn get(&self, key: &str) -> Option<CacheValue>;

    /// Inserts or replaces `key`. A `None` TTL uses the instance default.
    fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>);

    /// Same expiry semantics as `get`, without touching recency or frequency.
    fn exists(&self, key: &str) -> bool;

    /// Deletes `key` if present.
    fn remove(&self, key: &str);

    /// Physically stored entries, expired ones included until purged.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops background work owned by the instance. No-op by default.
    fn close(&self) {}

    /// False once `close` has stopped work the instance depends on.
    fn is_active(&self) -> bool {
        true
    }
}

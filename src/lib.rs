//! Policy Cache - in-process key-value caches with pluggable eviction
//!
//! Provides Basic, LRU, LFU and TTL caches, built and deduplicated through a
//! configuration-keyed registry.

pub mod cache;
pub mod config;
pub mod error;
pub mod registry;
pub mod tasks;

pub use cache::{Cache, CacheHandle, CacheValue};
pub use config::{CacheConfig, Cacheable, PolicyKind};
pub use error::{CacheError, Result};
pub use registry::{get_or_create_cache, global_registry, CacheRegistry, IdentityKey};

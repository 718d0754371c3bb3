//! Instance Registry
//!
//! Builds cache instances from configurations and deduplicates them by identity.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::info;

use crate::cache::{BasicCache, CacheHandle, LfuCache, LruCache, TtlCache};
use crate::config::{CacheConfig, PolicyKind};
use crate::error::{CacheError, Result};

// == Identity Key ==
/// Fingerprint of the configuration fields that select a cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub policy_kind: PolicyKind,
    pub capacity: usize,
    pub sweep_interval: Option<Duration>,
}

impl From<&CacheConfig> for IdentityKey {
    fn from(config: &CacheConfig) -> Self {
        Self {
            policy_kind: config.policy_kind,
            capacity: config.capacity,
            sweep_interval: config.sweep_interval,
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-", self.policy_kind, self.capacity)?;
        match self.sweep_interval {
            Some(interval) => write!(f, "{}ms", interval.as_millis()),
            None => f.write_str("none"),
        }
    }
}

// == Build Cache ==
/// Constructs a new, unregistered cache instance for `config`.
///
/// # Errors
/// - `MissingSweepInterval` for a TTL config without a sweep interval
/// - `InvalidConfig` for configurations that cannot hold any entry
/// - `SweeperStart` if the TTL sweeper fails to start
pub fn build_cache(config: &CacheConfig) -> Result<CacheHandle> {
    config.validate()?;

    let handle = match config.policy_kind {
        PolicyKind::Basic => CacheHandle::new(BasicCache::new(
            config.capacity,
            config.default_expiry,
        )),
        PolicyKind::Lru => CacheHandle::new(LruCache::new(
            config.capacity,
            config.max_capacity,
            config.default_expiry,
        )?),
        PolicyKind::Lfu => CacheHandle::new(LfuCache::new(
            config.capacity,
            config.max_capacity,
            config.default_expiry,
        )?),
        PolicyKind::Ttl => {
            let interval = config
                .sweep_interval
                .ok_or(CacheError::MissingSweepInterval)?;
            CacheHandle::new(TtlCache::new(
                config.capacity,
                config.default_expiry,
                interval,
            )?)
        }
    };

    Ok(handle)
}

// == Cache Registry ==
/// Table of live cache instances keyed by [`IdentityKey`].
///
/// Lookup and construction happen under one lock, so concurrent first
/// requests for an identity build exactly one instance.
#[derive(Debug, Default)]
pub struct CacheRegistry {
    instances: Mutex<HashMap<IdentityKey, CacheHandle>>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Get Or Create ==
    /// Returns the instance registered for `config`'s identity, building it if needed.
    ///
    /// An instance closed by a caller is replaced with a fresh one. A failed
    /// construction registers nothing.
    pub fn get_or_create(&self, config: &CacheConfig) -> Result<CacheHandle> {
        let identity = IdentityKey::from(config);
        let mut instances = self.instances.lock();

        if let Some(existing) = instances.get(&identity) {
            if existing.is_active() {
                return Ok(existing.clone());
            }
            instances.remove(&identity);
            info!(identity = %identity, "Dropped closed cache instance");
        }

        let handle = build_cache(config)?;
        info!(identity = %identity, "Created cache instance");
        instances.insert(identity, handle.clone());
        Ok(handle)
    }

    /// Shorthand for the default configuration of `kind`.
    pub fn get_or_create_kind(&self, kind: PolicyKind) -> Result<CacheHandle> {
        self.get_or_create(&CacheConfig::new(kind))
    }

    /// Looks up an active instance without creating one.
    pub fn get(&self, config: &CacheConfig) -> Option<CacheHandle> {
        self.instances
            .lock()
            .get(&IdentityKey::from(config))
            .filter(|handle| handle.is_active())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.lock().is_empty()
    }

    // == Shutdown ==
    /// Closes every registered instance and empties the registry.
    ///
    /// Returns the number of instances closed. Handles held elsewhere keep
    /// working, but TTL instances no longer sweep.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<_> = self.instances.lock().drain().collect();
        for (identity, handle) in &drained {
            handle.close();
            info!(identity = %identity, "Closed cache instance");
        }
        drained.len()
    }
}

static GLOBAL_REGISTRY: Lazy<CacheRegistry> = Lazy::new(CacheRegistry::new);

/// Process-wide registry behind [`get_or_create_cache`].
pub fn global_registry() -> &'static CacheRegistry {
    &GLOBAL_REGISTRY
}

/// Construct-or-fetch a cache from the process-wide registry.
pub fn get_or_create_cache(config: &CacheConfig) -> Result<CacheHandle> {
    GLOBAL_REGISTRY.get_or_create(config)
}

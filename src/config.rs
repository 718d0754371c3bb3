//! Configuration Module
//!
//! Cache configuration, policy kinds and the declarative per-kind expiry sugar.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Defaults ==
/// Default initial capacity of the entry map
pub const DEFAULT_CAPACITY: usize = 100;

/// Default eviction bound for LRU/LFU caches
pub const DEFAULT_MAX_CAPACITY: usize = 100;

/// Default expiry for entries stored without an explicit TTL
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(30);

/// Default period between TTL sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

// == Policy Kind ==
/// Eviction/expiry strategy applied to a cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Unbounded store with lazy expiry on read
    #[default]
    Basic,
    /// Evicts the least recently used key when full
    Lru,
    /// Evicts the least frequently used key when full, ties by recency
    Lfu,
    /// Unbounded store purged periodically by a background sweeper
    Ttl,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Basic => "Basic",
            PolicyKind::Lru => "LRU",
            PolicyKind::Lfu => "LFU",
            PolicyKind::Ttl => "TTL",
        };
        f.write_str(name)
    }
}

impl FromStr for PolicyKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(PolicyKind::Basic),
            "lru" => Ok(PolicyKind::Lru),
            "lfu" => Ok(PolicyKind::Lfu),
            "ttl" => Ok(PolicyKind::Ttl),
            _ => Err(CacheError::UnsupportedPolicy(s.to_string())),
        }
    }
}

// == Cache Config ==
/// Parameters a cache instance is built from.
///
/// Immutable once handed to the registry. Only `policy_kind`, `capacity` and
/// `sweep_interval` take part in instance identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Which policy the instance runs
    pub policy_kind: PolicyKind,
    /// Initial capacity reserved for the entry map
    pub capacity: usize,
    /// Maximum number of keys held by LRU/LFU caches
    pub max_capacity: usize,
    /// Expiry applied when `set` is called without a TTL, None = never expires
    pub default_expiry: Option<Duration>,
    /// Period of the TTL sweeper
    pub sweep_interval: Option<Duration>,
}

impl CacheConfig {
    /// Creates a default configuration for the given policy kind.
    pub fn new(policy_kind: PolicyKind) -> Self {
        Self {
            policy_kind,
            ..Self::default()
        }
    }

    /// Creates a configuration whose default expiry comes from a [`Cacheable`] kind.
    pub fn for_cacheable<T: Cacheable>(policy_kind: PolicyKind) -> Self {
        Self::new(policy_kind).with_default_expiry(T::TIME_TO_LIVE.or(Some(DEFAULT_EXPIRY)))
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_default_expiry(mut self, default_expiry: Option<Duration>) -> Self {
        self.default_expiry = default_expiry;
        self
    }

    pub fn with_sweep_interval(mut self, sweep_interval: Option<Duration>) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    // == Validate ==
    /// Checks that the configuration can produce a working cache.
    ///
    /// # Errors
    /// - `MissingSweepInterval` for a TTL cache without a sweep interval
    /// - `InvalidConfig` for a zero sweep interval or a zero LRU/LFU bound
    pub fn validate(&self) -> Result<()> {
        match self.policy_kind {
            PolicyKind::Ttl => match self.sweep_interval {
                None => Err(CacheError::MissingSweepInterval),
                Some(interval) if interval.is_zero() => Err(CacheError::InvalidConfig(
                    "sweep interval must be greater than zero".to_string(),
                )),
                Some(_) => Ok(()),
            },
            PolicyKind::Lru | PolicyKind::Lfu if self.max_capacity == 0 => {
                Err(CacheError::InvalidConfig(format!(
                    "{} cache requires a max capacity greater than zero",
                    self.policy_kind
                )))
            }
            _ => Ok(()),
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_POLICY` - basic, lru, lfu or ttl (default: basic)
    /// - `CACHE_CAPACITY` - Initial map capacity (default: 100)
    /// - `CACHE_MAX_CAPACITY` - LRU/LFU bound (default: 100)
    /// - `CACHE_DEFAULT_EXPIRY_SECS` - Default TTL in seconds (default: 30)
    /// - `CACHE_SWEEP_INTERVAL_SECS` - Sweep period in seconds (default: 300)
    ///
    /// Unparsable numbers fall back to their defaults; an unknown policy name
    /// is an error.
    pub fn from_env() -> Result<Self> {
        let policy_kind = match env::var("CACHE_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => PolicyKind::default(),
        };

        Ok(Self {
            policy_kind,
            capacity: env_number("CACHE_CAPACITY").unwrap_or(DEFAULT_CAPACITY),
            max_capacity: env_number("CACHE_MAX_CAPACITY").unwrap_or(DEFAULT_MAX_CAPACITY),
            default_expiry: Some(
                env_number("CACHE_DEFAULT_EXPIRY_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_EXPIRY),
            ),
            sweep_interval: Some(
                env_number("CACHE_SWEEP_INTERVAL_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_SWEEP_INTERVAL),
            ),
        })
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy_kind: PolicyKind::Basic,
            capacity: DEFAULT_CAPACITY,
            max_capacity: DEFAULT_MAX_CAPACITY,
            default_expiry: Some(DEFAULT_EXPIRY),
            sweep_interval: Some(DEFAULT_SWEEP_INTERVAL),
        }
    }
}

fn env_number<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

// == Cacheable ==
/// Declares a cache key and expiry for a kind of value.
///
/// ```
/// use std::time::Duration;
/// use policy_cache::Cacheable;
///
/// #[derive(Clone)]
/// struct UserProfile {
///     name: String,
/// }
///
/// impl Cacheable for UserProfile {
///     const CACHE_KEY: &'static str = "user-profile";
///     const TIME_TO_LIVE: Option<Duration> = Some(Duration::from_secs(120));
/// }
/// ```
pub trait Cacheable {
    /// Tag the value is stored under
    const CACHE_KEY: &'static str;
    /// Expiry for this kind, None falls back to the cache default
    const TIME_TO_LIVE: Option<Duration>;
}

//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache construction and typed lookups.
///
/// Misses are not errors: `get`/`exists` on a missing or expired key simply
/// report absence.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A TTL cache was requested without a sweep interval
    #[error("Missing sweep interval: TTL cache requires a sweep interval")]
    MissingSweepInterval,

    /// The requested policy kind is not one this engine provides
    #[error("Unsupported cache policy: {0}")]
    UnsupportedPolicy(String),

    /// Configuration values that cannot produce a working cache
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Stored value has a different runtime type than the one requested
    #[error("Type mismatch for key {key}: expected {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// The background sweeper could not be started
    #[error("Failed to start sweeper: {0}")]
    SweeperStart(#[source] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;

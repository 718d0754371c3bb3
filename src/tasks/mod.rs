//! Background Tasks Module
//!
//! Contains background tasks owned by cache instances.
//!
//! # Tasks
//! - TTL Sweeper: Removes expired cache entries at a configured interval

mod sweeper;

pub use sweeper::Sweeper;

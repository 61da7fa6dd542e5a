//! The concurrent bounded-capacity cache engine and its eviction-policy abstraction.
//!
//! This crate is the authoritative, transport-agnostic core of the cache daemon: a thread-safe
//! [`CacheEngine`] that owns key-value entries under a strict byte budget, and an
//! [`EvictionPolicy`] trait with [`FifoPolicy`] and [`LruPolicy`] implementations that decide
//! which key to evict when the budget is exceeded.

pub mod engine;
pub mod error;
pub mod fifo;
pub mod lru;
pub mod policy;

pub use engine::CacheEngine;
pub use error::{CacheError, Result};
pub use fifo::FifoPolicy;
pub use lru::LruPolicy;
pub use policy::EvictionPolicy;

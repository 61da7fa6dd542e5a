//! Error types for the cache engine.
//!
//! Per-operation failures (oversized SET, absent key) are silent by design (see
//! [`crate::engine::CacheEngine`]) and are not represented here. This enum only covers
//! construction-time misuse, which is the one place the engine can genuinely fail to come up.

use thiserror::Error;

/// Errors that can occur while constructing a [`crate::engine::CacheEngine`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// `maxmem` of zero admits no entries at all and is almost certainly a misconfiguration.
    #[error("maxmem must be greater than zero")]
    ZeroCapacity,
}

/// Result type for engine construction.
pub type Result<T> = std::result::Result<T, CacheError>;

//! Errors a [`crate::CacheClient`] call can fail with.

use thiserror::Error;

/// Everything that can go wrong issuing a request against a cache daemon.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The underlying HTTP request could not be sent or the connection was refused.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server's response did not match the wire grammar this client speaks.
    #[error("protocol error: {0}")]
    Protocol(#[from] cache_protocol::CodecError),

    /// The server responded with a status this client has no interpretation for.
    #[error("unexpected status {status} from {method} {path}")]
    UnexpectedStatus {
        status: u16,
        method: &'static str,
        path: String,
    },

    /// A response header required to interpret the reply was missing or malformed.
    #[error("missing or malformed '{header}' header")]
    MalformedHeader { header: &'static str },
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

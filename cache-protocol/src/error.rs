//! Errors produced while decoding a wire request or response.

use thiserror::Error;

/// A malformed request or response at the wire layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The HTTP method isn't one of GET/HEAD/PUT/DELETE/POST.
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),

    /// The URI path had no key segment where one was required.
    #[error("missing key in request path")]
    MissingKey,

    /// A key or value segment contained the `/` delimiter.
    #[error("key or value segment contains '/'")]
    SegmentContainsSlash,

    /// A PUT path had a key but no `/value` segment after it.
    #[error("PUT request is missing its value segment")]
    MissingValue,

    /// A POST to anything other than `/reset`. Answered with 404, not 400: RESET is the only
    /// POST route that exists, so any other POST target is simply not found.
    #[error("unknown POST route: {0}")]
    UnknownPostRoute(String),

    /// A HEAD to anything other than `/`.
    #[error("unknown route: {0}")]
    UnknownRoute(String),

    /// A response or value segment was not valid UTF-8 text.
    #[error("payload is not valid UTF-8 text")]
    InvalidUtf8,

    /// A GET response body could not be parsed as the expected JSON shape.
    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;

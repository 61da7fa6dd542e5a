//! Encodes and decodes the cache daemon's five operations as HTTP request/response pairs on a
//! fixed URI scheme. This crate is transport-agnostic: it only deals in method/path strings and
//! JSON bodies, so it is shared verbatim between the server and the client.
//!
//! ```text
//! PUT    /{key}/{value}   -> SET
//! GET    /{key}           -> GET
//! DELETE /{key}           -> DEL
//! POST   /reset           -> RESET (any other POST is a 404)
//! HEAD   /                -> SPACE
//! ```

pub mod error;

pub use error::{CodecError, Result};

use serde::{Deserialize, Serialize};

/// A decoded client request, independent of how it arrived over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `PUT /{key}/{value}`.
    Set { key: String, value: String },
    /// `GET /{key}`.
    Get { key: String },
    /// `DELETE /{key}`.
    Delete { key: String },
    /// `POST /reset`.
    Reset,
    /// `HEAD /`.
    Space,
}

/// The JSON body of a successful GET response: `{ "key": "...", "value": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetBody {
    pub key: String,
    pub value: String,
}

/// The response header name carrying the engine's current byte usage.
pub const SPACE_USED_HEADER: &str = "Space-Used";

/// The response header name carrying the boolean result of a DELETE.
pub const DELETE_BOOL_HEADER: &str = "Delete-Bool";

/// The body returned on a GET miss.
pub const GET_MISS_BODY: &str = "Key not in cache\n";

/// Decodes an HTTP method + path into a [`Request`].
///
/// This is the server-side half of the wire contract; the corresponding client-side half is
/// [`Request::into_target`].
pub fn decode_request(method: &str, path: &str) -> Result<Request> {
    let rest = path.strip_prefix('/').unwrap_or(path);

    match method.to_ascii_uppercase().as_str() {
        "PUT" => {
            let (key, value) = rest.split_once('/').ok_or(CodecError::MissingValue)?;
            if key.is_empty() {
                return Err(CodecError::MissingKey);
            }
            if value.contains('/') {
                return Err(CodecError::SegmentContainsSlash);
            }
            Ok(Request::Set {
                key: key.to_string(),
                value: value.to_string(),
            })
        }
        "GET" => {
            if rest.is_empty() {
                return Err(CodecError::MissingKey);
            }
            if rest.contains('/') {
                return Err(CodecError::SegmentContainsSlash);
            }
            Ok(Request::Get { key: rest.to_string() })
        }
        "DELETE" => {
            if rest.is_empty() {
                return Err(CodecError::MissingKey);
            }
            if rest.contains('/') {
                return Err(CodecError::SegmentContainsSlash);
            }
            Ok(Request::Delete { key: rest.to_string() })
        }
        "POST" => {
            if rest == "reset" {
                Ok(Request::Reset)
            } else {
                Err(CodecError::UnknownPostRoute(format!("/{rest}")))
            }
        }
        "HEAD" => {
            if rest.is_empty() {
                Ok(Request::Space)
            } else {
                Err(CodecError::UnknownRoute(format!("/{rest}")))
            }
        }
        other => Err(CodecError::UnknownMethod(other.to_string())),
    }
}

impl Request {
    /// Renders this request as the `(method, path)` pair a client should send over the wire.
    pub fn into_target(self) -> (&'static str, String) {
        match self {
            Request::Set { key, value } => ("PUT", format!("/{key}/{value}")),
            Request::Get { key } => ("GET", format!("/{key}")),
            Request::Delete { key } => ("DELETE", format!("/{key}")),
            Request::Reset => ("POST", "/reset".to_string()),
            Request::Space => ("HEAD", "/".to_string()),
        }
    }
}

/// Encodes a textual value into the bytes the engine should store.
///
/// A trailing NUL sentinel is appended, matching the cache's C-string-derived byte accounting:
/// a value of `n` visible characters occupies `n + 1` bytes of the budget.
pub fn encode_value(value: &str) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// Decodes engine-stored bytes back into the textual value for wire transport.
///
/// Strips a single trailing NUL sentinel, if present, before UTF-8 decoding — the inverse of
/// [`encode_value`].
pub fn decode_value(bytes: &[u8]) -> Result<String> {
    let trimmed = match bytes.last() {
        Some(0) => &bytes[..bytes.len() - 1],
        _ => bytes,
    };
    String::from_utf8(trimmed.to_vec()).map_err(|_| CodecError::InvalidUtf8)
}

/// Builds the JSON body for a successful GET response.
pub fn encode_get_body(key: &str, stored_bytes: &[u8]) -> Result<String> {
    let value = decode_value(stored_bytes)?;
    let body = GetBody {
        key: key.to_string(),
        value,
    };
    serde_json::to_string(&body).map_err(|e| CodecError::MalformedBody(e.to_string()))
}

/// Parses a GET response JSON body back into `(key, stored_bytes)`.
pub fn decode_get_body(json: &str) -> Result<(String, Vec<u8>)> {
    let body: GetBody =
        serde_json::from_str(json).map_err(|e| CodecError::MalformedBody(e.to_string()))?;
    let bytes = encode_value(&body.value);
    Ok((body.key, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_put_into_set() {
        assert_eq!(
            decode_request("PUT", "/Item1/314159").unwrap(),
            Request::Set {
                key: "Item1".to_string(),
                value: "314159".to_string(),
            }
        );
    }

    #[test]
    fn decodes_get_and_delete() {
        assert_eq!(
            decode_request("GET", "/Item1").unwrap(),
            Request::Get { key: "Item1".to_string() }
        );
        assert_eq!(
            decode_request("DELETE", "/Item1").unwrap(),
            Request::Delete { key: "Item1".to_string() }
        );
    }

    #[test]
    fn decodes_reset_and_space() {
        assert_eq!(decode_request("POST", "/reset").unwrap(), Request::Reset);
        assert_eq!(decode_request("HEAD", "/").unwrap(), Request::Space);
    }

    #[test]
    fn rejects_unknown_post_route() {
        assert!(matches!(
            decode_request("POST", "/whatever"),
            Err(CodecError::UnknownPostRoute(_))
        ));
    }

    #[test]
    fn rejects_unknown_head_route() {
        assert!(matches!(
            decode_request("HEAD", "/whatever"),
            Err(CodecError::UnknownRoute(_))
        ));
    }

    #[test]
    fn rejects_unknown_method() {
        assert!(matches!(
            decode_request("PATCH", "/x"),
            Err(CodecError::UnknownMethod(_))
        ));
    }

    #[test]
    fn rejects_missing_key() {
        assert!(matches!(decode_request("GET", "/"), Err(CodecError::MissingKey)));
    }

    #[test]
    fn rejects_extra_path_segments() {
        assert!(matches!(
            decode_request("GET", "/a/b"),
            Err(CodecError::SegmentContainsSlash)
        ));
    }

    #[test]
    fn value_round_trips_through_get_body() {
        let bytes = encode_value("314159");
        assert_eq!(bytes, b"314159\0");
        let json = encode_get_body("Item1", &bytes).unwrap();
        let (key, decoded_bytes) = decode_get_body(&json).unwrap();
        assert_eq!(key, "Item1");
        assert_eq!(decoded_bytes, bytes);
    }

    #[test]
    fn request_round_trips_through_target() {
        let original = Request::Set {
            key: "k".to_string(),
            value: "v".to_string(),
        };
        let (method, path) = original.clone().into_target();
        assert_eq!((method, path.as_str()), ("PUT", "/k/v"));
        assert_eq!(decode_request(method, &path).unwrap(), original);
    }
}

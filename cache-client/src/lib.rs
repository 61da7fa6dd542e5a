//! A blocking client for the cache daemon's HTTP wire protocol.
//!
//! Each call opens a connection, issues one request, blocks for the reply, and returns — there is
//! no connection pooling or pipelining here beyond what [`reqwest::blocking::Client`] already
//! does internally.

pub mod error;

pub use error::{ClientError, Result};

use cache_protocol::{decode_get_body, decode_value, DELETE_BOOL_HEADER, SPACE_USED_HEADER};
use reqwest::blocking::Client as HttpClient;
use tracing::debug;

/// Talks to a single cache daemon over HTTP.
#[derive(Debug, Clone)]
pub struct CacheClient {
    http: HttpClient,
    base_url: String,
}

impl CacheClient {
    /// Builds a client targeting `host:port`.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: format!("http://{host}:{port}"),
        }
    }

    /// Builds a client targeting an arbitrary base URL, e.g. a mock server's address.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.into(),
        }
    }

    /// `PUT /{key}/{value}`. Returns the daemon's total byte usage after the write.
    pub fn set(&self, key: &str, value: &str) -> Result<usize> {
        let url = format!("{}/{key}/{value}", self.base_url);
        let response = self.http.put(&url).send()?;
        self.space_used_from(&response, "PUT", &url)
    }

    /// `GET /{key}`. Returns `None` if the key is not present.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let url = format!("{}/{key}", self.base_url);
        let response = self.http.get(&url).send()?;
        match response.status().as_u16() {
            200 => {
                let body = response.text()?;
                let (_, bytes) = decode_get_body(&body)?;
                Ok(Some(decode_value(&bytes)?))
            }
            404 => {
                debug!(key, "cache miss");
                Ok(None)
            }
            status => Err(ClientError::UnexpectedStatus {
                status,
                method: "GET",
                path: url,
            }),
        }
    }

    /// `DELETE /{key}`. Returns whether the key was present.
    pub fn del(&self, key: &str) -> Result<bool> {
        let url = format!("{}/{key}", self.base_url);
        let response = self.http.delete(&url).send()?;
        let header = response
            .headers()
            .get(DELETE_BOOL_HEADER)
            .ok_or(ClientError::MalformedHeader {
                header: DELETE_BOOL_HEADER,
            })?
            .to_str()
            .map_err(|_| ClientError::MalformedHeader {
                header: DELETE_BOOL_HEADER,
            })?;
        Ok(header == "true")
    }

    /// `POST /reset`. Drops every key and resets usage to zero.
    pub fn reset(&self) -> Result<()> {
        let url = format!("{}/reset", self.base_url);
        self.http.post(&url).send()?;
        Ok(())
    }

    /// `HEAD /`. Returns the daemon's total byte usage.
    pub fn space_used(&self) -> Result<usize> {
        let url = format!("{}/", self.base_url);
        let response = self.http.head(&url).send()?;
        self.space_used_from(&response, "HEAD", &url)
    }

    fn space_used_from(
        &self,
        response: &reqwest::blocking::Response,
        method: &'static str,
        url: &str,
    ) -> Result<usize> {
        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: response.status().as_u16(),
                method,
                path: url.to_string(),
            });
        }
        let header = response
            .headers()
            .get(SPACE_USED_HEADER)
            .ok_or(ClientError::MalformedHeader {
                header: SPACE_USED_HEADER,
            })?;
        header
            .to_str()
            .ok()
            .and_then(|v| v.parse().ok())
            .ok_or(ClientError::MalformedHeader {
                header: SPACE_USED_HEADER,
            })
    }
}

//! HTTP transport layer.
//!
//! The client only needs "send a request, get status + headers + bytes back,
//! respect a timeout". [`Transport`] is that capability; [`ReqwestTransport`]
//! is the production implementation on top of `reqwest::blocking`.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Method;
use thiserror::Error;
use url::Url;

use crate::error::{Error, Result};

/// A fully composed request, ready to put on the wire.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL without the query string.
    pub url: Url,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<serde_json::Value>,
    /// Timeout for the whole exchange.
    pub timeout: Duration,
}

/// A raw response.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, keyed by lowercase name.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Look up a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Transport-level failure.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not establish a connection.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The exchange did not finish within the timeout.
    #[error("timed out: {0}")]
    Timeout(String),
    /// Anything else that went wrong below HTTP.
    #[error("{0}")]
    Other(String),
}

/// Something that can execute HTTP requests.
pub trait Transport: Send + Sync {
    /// Execute one request.
    fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a pooled `reqwest` blocking client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Build a transport with connection pooling.
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .pool_max_idle_per_host(5)
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing blocking client.
    pub fn from_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .timeout(request.timeout);

        // Signed URLs carry their own query string; leave it untouched.
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(classify)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.bytes().map_err(classify)?.to_vec();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut headers = HashMap::new();
        headers.insert("retry-after".to_string(), "5".to_string());
        let response = TransportResponse {
            status: 429,
            headers,
            body: Vec::new(),
        };
        assert_eq!(response.header("Retry-After"), Some("5"));
        assert_eq!(response.header("content-type"), None);
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new().is_ok());
    }

    #[test]
    fn test_unreachable_host_is_connect_error() {
        let transport = ReqwestTransport::new().unwrap();
        let request = TransportRequest {
            method: Method::GET,
            // Port 9 (discard) on localhost is closed on test machines.
            url: Url::parse("http://127.0.0.1:9/").unwrap(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: Duration::from_secs(5),
        };
        match transport.send(request) {
            Err(TransportError::Connect(_)) | Err(TransportError::Other(_)) => {}
            other => panic!("expected a transport failure, got {other:?}"),
        }
    }
}

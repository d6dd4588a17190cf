//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use mapiry::{
    ClientBuilder, MapiryClient, Sleeper, Transport, TransportError, TransportRequest,
    TransportResponse,
};

/// Token used by every test client.
pub const TOKEN: &str = "MLY|test-token";

/// A transport that replays scripted outcomes and records every request.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a JSON response.
    pub fn push_json(&self, status: u16, body: Value) {
        self.push_response(status, body.to_string().into_bytes(), &[]);
    }

    /// Queue a response with raw bytes and headers.
    pub fn push_response(&self, status: u16, body: Vec<u8>, headers: &[(&str, &str)]) {
        let headers: HashMap<String, String> = headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();
        self.script.lock().push_back(Ok(TransportResponse {
            status,
            headers,
            body,
        }));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.script.lock().push_back(Err(error));
    }

    /// Requests sent so far.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests sent so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// The most recent request.
    pub fn last_request(&self) -> TransportRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl Transport for MockTransport {
    fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push(request);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("mock script exhausted".into())))
    }
}

/// A sleeper that records durations instead of blocking.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.lock().push(duration);
    }
}

/// Test harness: a client wired to a mock transport and recording sleeper.
pub struct Harness {
    pub client: MapiryClient,
    pub transport: Arc<MockTransport>,
    pub sleeper: Arc<RecordingSleeper>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_builder(|b| b)
    }

    /// Build with extra builder settings.
    pub fn with_builder(configure: impl FnOnce(ClientBuilder) -> ClientBuilder) -> Self {
        let transport = MockTransport::new();
        let sleeper = RecordingSleeper::new();
        let builder = MapiryClient::builder()
            .access_token(TOKEN)
            .transport(transport.clone())
            .sleeper(sleeper.clone());
        let client = configure(builder).build().expect("client should build");
        Self {
            client,
            transport,
            sleeper,
        }
    }
}

/// Value of a query parameter on a recorded request.
pub fn param<'a>(request: &'a TransportRequest, key: &str) -> Option<&'a str> {
    request
        .query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Value of a header on a recorded request.
pub fn header<'a>(request: &'a TransportRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// A feature-collection envelope around `features`.
pub fn envelope(features: Vec<Value>) -> Value {
    serde_json::json!({ "features": features })
}

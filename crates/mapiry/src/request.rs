//! Request and response values for the generic request surface.

use std::collections::HashMap;

use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

/// How the access token is attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Auth {
    /// `Authorization: OAuth <token>` header.
    #[default]
    Header,
    /// `access_token=<token>` query parameter. The tile service only accepts
    /// this form.
    QueryToken,
    /// No credentials, e.g. for signed CDN URLs.
    None,
}

/// A request against one of the API's base URLs.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<Value>,
    pub(crate) base_url: Option<Url>,
    pub(crate) auth: Auth,
}

impl ApiRequest {
    /// Create a request for `path`, relative to the metadata API base.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            base_url: None,
            auth: Auth::Header,
        }
    }

    /// GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Append query parameters.
    pub fn query<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Append a single query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a JSON body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Resolve `path` against this base instead of the metadata API.
    pub fn base_url(mut self, base: Url) -> Self {
        self.base_url = Some(base);
        self
    }

    /// Choose how credentials are attached.
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the base URL.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// The body parsed as JSON.
    Json(Value),
    /// The body was not JSON (tiles, images, empty bodies).
    Raw(RawResponse),
}

/// A non-JSON response body with its headers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body bytes.
    pub content: Vec<u8>,
    /// Headers, keyed by lowercase name.
    pub headers: HashMap<String, String>,
}

impl ApiResponse {
    /// The JSON body, failing if the server sent something else.
    pub fn into_json(self) -> Result<Value> {
        match self {
            ApiResponse::Json(value) => Ok(value),
            ApiResponse::Raw(raw) => Err(Error::Api {
                status: raw.status,
                message: "expected a JSON response body".to_string(),
                body: None,
            }),
        }
    }

    /// The body bytes. JSON bodies are re-encoded.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ApiResponse::Json(value) => serde_json::to_vec(&value).unwrap_or_default(),
            ApiResponse::Raw(raw) => raw.content,
        }
    }

    /// True for JSON bodies.
    pub fn is_json(&self) -> bool {
        matches!(self, ApiResponse::Json(_))
    }
}

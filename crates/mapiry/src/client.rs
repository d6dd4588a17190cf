//! Main client implementation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::api::{
    DetectionsApi, ImagesApi, MapFeaturesApi, OrganizationsApi, SequencesApi, VectorTilesApi,
};
use crate::config::ClientConfig;
use crate::error::{Error, ErrorResponse, Result, parse_retry_after};
use crate::request::{ApiRequest, ApiResponse, Auth, RawResponse};
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::transport::{
    ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse,
};
use crate::types::{FromEnvelope, PagedResponse};
use crate::validate::require_path_segment;

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Graph (metadata) API.
pub const DEFAULT_API_URL: &str = "https://graph.mapillary.com";
/// Per-layer vector tiles.
pub const DEFAULT_TILES_URL: &str = "https://tiles.mapillary.com/maps/vtp";
/// Coverage tiles.
pub const DEFAULT_COVERAGE_URL: &str = "https://tiles.mapillary.com/maps/vtp/mly1_public/2";
/// Computed coverage tiles.
pub const DEFAULT_COMPUTED_COVERAGE_URL: &str =
    "https://tiles.mapillary.com/maps/vtp/mly1_computed_public/2";
/// Map feature point tiles.
pub const DEFAULT_MAP_FEATURE_POINTS_URL: &str =
    "https://tiles.mapillary.com/maps/vtp/mly_map_feature_point/2";
/// Map feature traffic sign tiles.
pub const DEFAULT_MAP_FEATURE_TRAFFIC_SIGNS_URL: &str =
    "https://tiles.mapillary.com/maps/vtp/mly_map_feature_traffic_sign/2";

/// Mapillary API client.
///
/// Cloning is cheap: clones share the transport and configuration. Resource
/// accessors return a fresh, empty query builder on every call.
///
/// # Example
///
/// ```no_run
/// use mapiry::MapiryClient;
///
/// # fn example() -> mapiry::Result<()> {
/// let client = MapiryClient::new("MLY|your-token")?;
///
/// let page = client
///     .images()
///     .in_bbox(-122.16, 37.48, -122.14, 37.49)?
///     .fields(["id", "captured_at", "thumb_1024_url"])
///     .limit(10)?
///     .get()?;
///
/// for image in page {
///     println!("{} {:?}", image.id, image.captured_at);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MapiryClient {
    /// Inner shared state.
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
struct ClientInner {
    /// HTTP transport.
    transport: Arc<dyn Transport>,
    /// Waits between retries.
    sleeper: Arc<dyn Sleeper>,
    /// API access token.
    access_token: String,
    /// Base URL per endpoint family.
    urls: BaseUrls,
    /// Request timeout.
    timeout: Duration,
    /// Retry policy for transient failures.
    retry: RetryPolicy,
    /// User-Agent header value.
    user_agent: String,
}

/// Base URL for each endpoint family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrls {
    /// Graph (metadata) API.
    pub api: Url,
    /// Per-layer vector tiles.
    pub tiles: Url,
    /// Coverage tiles.
    pub coverage: Url,
    /// Computed coverage tiles.
    pub computed_coverage: Url,
    /// Map feature point tiles.
    pub map_feature_points: Url,
    /// Map feature traffic sign tiles.
    pub map_feature_traffic_signs: Url,
}

impl fmt::Debug for MapiryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapiryClient")
            .field("api", &self.inner.urls.api.as_str())
            .field("timeout", &self.inner.timeout)
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

impl MapiryClient {
    /// Create a client with default settings.
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::builder().access_token(access_token).build()
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config).build()
    }

    /// Base URLs in use.
    pub fn base_urls(&self) -> &BaseUrls {
        &self.inner.urls
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.retry
    }

    /// Release this handle. The transport and its connection pool are
    /// dropped once every clone, including those held by builders, is gone.
    pub fn close(self) {
        tracing::debug!(
            handles = Arc::strong_count(&self.inner),
            "Closing Mapillary client"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Query images.
    pub fn images(&self) -> ImagesApi {
        ImagesApi::new(self.clone())
    }

    /// Query sequences.
    pub fn sequences(&self) -> SequencesApi {
        SequencesApi::new(self.clone())
    }

    /// Query detections.
    pub fn detections(&self) -> DetectionsApi {
        DetectionsApi::new(self.clone())
    }

    /// Query map features.
    pub fn map_features(&self) -> MapFeaturesApi {
        MapFeaturesApi::new(self.clone())
    }

    /// Query organizations.
    pub fn organizations(&self) -> OrganizationsApi {
        OrganizationsApi::new(self.clone())
    }

    /// Fetch vector tiles.
    pub fn vector_tiles(&self) -> VectorTilesApi {
        VectorTilesApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request surface
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute a request, retrying transient failures.
    pub fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
        let base = request.base_url.as_ref().unwrap_or(&self.inner.urls.api);
        let url = compose_url(base, &request.path)?;

        let mut query = request.query;
        let mut headers = vec![
            ("User-Agent".to_string(), self.inner.user_agent.clone()),
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        match request.auth {
            Auth::Header => headers.push((
                "Authorization".to_string(),
                format!("OAuth {}", self.inner.access_token),
            )),
            Auth::QueryToken => {
                query.push(("access_token".to_string(), self.inner.access_token.clone()))
            }
            Auth::None => {}
        }

        let prepared = TransportRequest {
            method: request.method,
            url,
            query,
            headers,
            body: request.body,
            timeout: self.inner.timeout,
        };

        self.inner
            .retry
            .run(self.inner.sleeper.as_ref(), |attempt| {
                tracing::debug!(
                    method = %prepared.method,
                    url = %prepared.url,
                    attempt = attempt + 1,
                    "Sending request"
                );
                self.execute(prepared.clone())
            })
    }

    /// GET a JSON resource from the metadata API.
    pub fn get<I, K, V>(&self, path: &str, query: I) -> Result<Value>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.request(ApiRequest::get(path).query(query))?.into_json()
    }

    /// POST a JSON body to the metadata API.
    pub fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.request(ApiRequest::post(path).body(body))?.into_json()
    }

    /// PUT a JSON body to the metadata API.
    pub fn put(&self, path: &str, body: Value) -> Result<Value> {
        self.request(ApiRequest::new(Method::PUT, path).body(body))?
            .into_json()
    }

    /// DELETE a metadata API resource.
    pub fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(ApiRequest::new(Method::DELETE, path))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Typed helpers for the resource builders
    // ─────────────────────────────────────────────────────────────────────────

    /// GET a list endpoint and parse the feature collection.
    pub(crate) fn fetch_page<T: FromEnvelope>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<PagedResponse<T>> {
        let body = self.get(path, query)?;
        PagedResponse::from_envelope(body).map_err(decode_error)
    }

    /// GET `/{id}` and parse a single entity. `field` names the id argument
    /// in validation errors.
    pub(crate) fn fetch_by_id<T: FromEnvelope>(
        &self,
        id: &str,
        field: &str,
        query: Vec<(String, String)>,
    ) -> Result<T> {
        require_path_segment(id, field)?;
        let body = self.get(id, query)?;
        T::from_envelope(body).map_err(decode_error)
    }

    /// Fetch raw bytes from `base/path` with the given auth mode.
    pub(crate) fn fetch_bytes(&self, base: Url, path: &str, auth: Auth) -> Result<Vec<u8>> {
        let request = ApiRequest::get(path).base_url(base).auth(auth);
        Ok(self.request(request)?.into_bytes())
    }

    /// One attempt: send and map the outcome.
    fn execute(&self, request: TransportRequest) -> Result<ApiResponse> {
        let url = request.url.clone();
        let response = self.inner.transport.send(request).map_err(|e| match e {
            TransportError::Timeout(_) => Error::Timeout(format!(
                "{} after {}s",
                url,
                self.inner.timeout.as_secs()
            )),
            TransportError::Connect(msg) => {
                Error::Network(format!("failed to connect to {}: {}", url, msg))
            }
            TransportError::Other(msg) => Error::Network(msg),
        })?;
        handle_response(response)
    }
}

/// Join base and path with exactly one `/`. An empty path is the base itself.
fn compose_url(base: &Url, path: &str) -> Result<Url> {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Ok(base.clone());
    }
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path);
    Url::parse(&joined).map_err(|e| Error::validation(format!("{}: {}", joined, e), "path"))
}

/// Map a response to a value or a typed error.
fn handle_response(response: TransportResponse) -> Result<ApiResponse> {
    let status = response.status;

    if (200..300).contains(&status) {
        return Ok(match serde_json::from_slice(&response.body) {
            Ok(value) => ApiResponse::Json(value),
            Err(_) => ApiResponse::Raw(RawResponse {
                status,
                content: response.body,
                headers: response.headers,
            }),
        });
    }

    let body = serde_json::from_slice::<Value>(&response.body).ok();
    let message = match &body {
        Some(value) => serde_json::from_value::<ErrorResponse>(value.clone())
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| "Unknown error".to_string()),
        None => match StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
        {
            Some(reason) => format!("HTTP {}: {}", status, reason),
            None => format!("HTTP {}", status),
        },
    };

    Err(match status {
        401 => Error::Authentication(message),
        403 => Error::Authentication(format!("access forbidden: {}", message)),
        404 => Error::NotFound(message),
        429 => {
            let header = response.header("retry-after");
            Error::RateLimit {
                message: match header {
                    Some(value) => format!("{} (retry after {} seconds)", message, value),
                    None => message,
                },
                retry_after: header.and_then(parse_retry_after),
            }
        }
        _ => Error::Api {
            status,
            message,
            body,
        },
    })
}

/// A 2xx body that does not have the expected shape.
fn decode_error(err: serde_json::Error) -> Error {
    Error::Api {
        status: 200,
        message: format!("failed to decode response: {}", err),
        body: None,
    }
}

/// Builder for creating a [`MapiryClient`].
pub struct ClientBuilder {
    access_token: Option<String>,
    timeout: Duration,
    max_retries: u32,
    retry_backoff: f64,
    user_agent: Option<String>,
    api_url: Option<String>,
    tiles_url: Option<String>,
    coverage_url: Option<String>,
    computed_coverage_url: Option<String>,
    map_feature_points_url: Option<String>,
    map_feature_traffic_signs_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        let retry = RetryPolicy::default();
        Self {
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: retry.max_retries,
            retry_backoff: retry.backoff_factor,
            user_agent: None,
            api_url: None,
            tiles_url: None,
            coverage_url: None,
            computed_coverage_url: None,
            map_feature_points_url: None,
            map_feature_traffic_signs_url: None,
            transport: None,
            sleeper: None,
        }
    }

    /// Seed a builder from loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        let urls = &config.urls;
        Self {
            access_token: config.access_token.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
            user_agent: config.user_agent.clone(),
            api_url: urls.api.clone(),
            tiles_url: urls.tiles.clone(),
            coverage_url: urls.coverage.clone(),
            computed_coverage_url: urls.computed_coverage.clone(),
            map_feature_points_url: urls.map_feature_points.clone(),
            map_feature_traffic_signs_url: urls.map_feature_traffic_signs.clone(),
            ..Self::new()
        }
    }

    /// Set the access token.
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how many times transient failures are retried.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the backoff factor in seconds.
    pub fn retry_backoff(mut self, factor: f64) -> Self {
        self.retry_backoff = factor;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Override the metadata API base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Override the vector tile base URL.
    pub fn tiles_url(mut self, url: impl Into<String>) -> Self {
        self.tiles_url = Some(url.into());
        self
    }

    /// Override the coverage tile base URL.
    pub fn coverage_url(mut self, url: impl Into<String>) -> Self {
        self.coverage_url = Some(url.into());
        self
    }

    /// Override the computed coverage tile base URL.
    pub fn computed_coverage_url(mut self, url: impl Into<String>) -> Self {
        self.computed_coverage_url = Some(url.into());
        self
    }

    /// Override the map feature point tile base URL.
    pub fn map_feature_points_url(mut self, url: impl Into<String>) -> Self {
        self.map_feature_points_url = Some(url.into());
        self
    }

    /// Override the map feature traffic sign tile base URL.
    pub fn map_feature_traffic_signs_url(mut self, url: impl Into<String>) -> Self {
        self.map_feature_traffic_signs_url = Some(url.into());
        self
    }

    /// Use a custom transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom sleeper between retries.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<MapiryClient> {
        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::Authentication("access token must be a non-empty string".to_string())
            })?;

        if !(self.retry_backoff.is_finite() && self.retry_backoff >= 0.0) {
            return Err(Error::Config(format!(
                "retry_backoff must be a non-negative number, got {}",
                self.retry_backoff
            )));
        }

        let urls = BaseUrls {
            api: parse_base("api_url", self.api_url, DEFAULT_API_URL)?,
            tiles: parse_base("tiles_url", self.tiles_url, DEFAULT_TILES_URL)?,
            coverage: parse_base("coverage_url", self.coverage_url, DEFAULT_COVERAGE_URL)?,
            computed_coverage: parse_base(
                "computed_coverage_url",
                self.computed_coverage_url,
                DEFAULT_COMPUTED_COVERAGE_URL,
            )?,
            map_feature_points: parse_base(
                "map_feature_points_url",
                self.map_feature_points_url,
                DEFAULT_MAP_FEATURE_POINTS_URL,
            )?,
            map_feature_traffic_signs: parse_base(
                "map_feature_traffic_signs_url",
                self.map_feature_traffic_signs_url,
                DEFAULT_MAP_FEATURE_TRAFFIC_SIGNS_URL,
            )?,
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let sleeper: Arc<dyn Sleeper> = match self.sleeper {
            Some(sleeper) => sleeper,
            None => Arc::new(ThreadSleeper),
        };
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("mapiry/{}", env!("CARGO_PKG_VERSION")));
        let retry = RetryPolicy::new(self.max_retries, self.retry_backoff);

        tracing::info!(
            api = %urls.api,
            timeout_secs = self.timeout.as_secs(),
            max_retries = retry.max_retries,
            "Mapillary client created"
        );

        Ok(MapiryClient {
            inner: Arc::new(ClientInner {
                transport,
                sleeper,
                access_token,
                urls,
                timeout: self.timeout,
                retry,
                user_agent,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_base(name: &str, value: Option<String>, default: &str) -> Result<Url> {
    let raw = value.as_deref().unwrap_or(default);
    Url::parse(raw).map_err(|e| Error::Config(format!("invalid {} '{}': {}", name, raw, e)))
}

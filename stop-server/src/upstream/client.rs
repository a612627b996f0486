//! Stop API HTTP client.
//!
//! Fetches a stop's status from the GiroMilano portal and turns the
//! response into a [`StopSnapshot`]. The portal sits behind bot protection
//! that rejects requests without browser-like headers and sometimes serves
//! HTML block pages with a 200 status, so responses are classified before
//! any attempt to parse them.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::domain::StopSnapshot;

use super::convert::parse_stop_body;
use super::error::{ApiError, TransportError};
use super::transport::{RawResponse, ReqwestTransport, Transport};

/// Default base URL for the stop endpoint; the stop id is appended.
pub const DEFAULT_BASE_URL: &str =
    "https://giromilano.atm.it/proxy.tpportal/api/tpPortal/geodata/pois/stops";

/// Default end-to-end timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Marker looked for in HTML bodies to recognise a block page.
const ACCESS_DENIED_MARKER: &str = "access denied";

const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Named set of request headers sent with every fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderProfile {
    name: String,
    headers: Vec<(String, String)>,
}

impl HeaderProfile {
    /// Headers the GiroMilano web app itself sends.
    pub fn giromilano() -> Self {
        Self {
            name: "giromilano".to_string(),
            headers: vec![
                ("accept".into(), "application/json, text/plain, */*".into()),
                ("accept-language".into(), "it-IT,it;q=0.9,en;q=0.8".into()),
                ("referer".into(), "https://giromilano.atm.it/".into()),
                ("origin".into(), "https://giromilano.atm.it".into()),
            ],
        }
    }

    /// The GiroMilano headers plus a desktop Chrome user agent and fetch metadata.
    pub fn chrome() -> Self {
        let mut profile = Self::giromilano();
        profile.name = "chrome".to_string();
        profile.headers.extend([
            ("user-agent".into(), CHROME_USER_AGENT.into()),
            ("sec-fetch-dest".into(), "empty".into()),
            ("sec-fetch-mode".into(), "cors".into()),
            ("sec-fetch-site".into(), "same-origin".into()),
        ]);
        profile
    }

    /// Look up a preset by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "giromilano" => Some(Self::giromilano()),
            "chrome" => Some(Self::chrome()),
            _ => None,
        }
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into().to_ascii_lowercase();
        self.headers.retain(|(n, _)| *n != name);
        self.headers.push((name, value.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the header map, rejecting invalid names or values.
    pub fn to_header_map(&self) -> Result<HeaderMap, ApiError> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::Client(format!("invalid header name {name:?}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::Client(format!("invalid value for header {name}")))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

impl Default for HeaderProfile {
    fn default() -> Self {
        Self::giromilano()
    }
}

/// Configuration for the stop client.
#[derive(Debug, Clone)]
pub struct StopClientConfig {
    /// Base URL; requests go to `{base_url}/{stop_id}`
    pub base_url: String,
    /// End-to-end request timeout in seconds
    pub timeout_secs: u64,
    /// Headers sent with every request
    pub header_profile: HeaderProfile,
}

impl StopClientConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            header_profile: HeaderProfile::default(),
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_header_profile(mut self, profile: HeaderProfile) -> Self {
        self.header_profile = profile;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StopClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Stop API client.
///
/// Holds no per-call state, so one client can serve concurrent fetches for
/// any number of stops. Each fetch is a single GET with no retries.
#[derive(Debug, Clone)]
pub struct StopClient<T = ReqwestTransport> {
    transport: T,
    base_url: String,
    headers: HeaderMap,
    timeout: Duration,
}

impl StopClient<ReqwestTransport> {
    /// Create a client that owns its connection pool.
    pub fn new(config: StopClientConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.timeout())
            .map_err(|e| ApiError::Client(format!("failed to build HTTP client: {e}")))?;
        Self::with_transport(config, transport)
    }

    /// Create a client on a shared connection pool.
    pub fn with_http(config: StopClientConfig, http: reqwest::Client) -> Result<Self, ApiError> {
        Self::with_transport(config, ReqwestTransport::with_client(http))
    }
}

impl<T: Transport> StopClient<T> {
    /// Create a client using a custom transport strategy.
    pub fn with_transport(config: StopClientConfig, transport: T) -> Result<Self, ApiError> {
        let headers = config.header_profile.to_header_map()?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            transport,
            base_url,
            headers,
            timeout: config.timeout(),
        })
    }

    /// URL for a stop.
    pub fn stop_url(&self, stop_id: &str) -> String {
        format!("{}/{}", self.base_url, stop_id)
    }

    /// Fetch a stop's current status.
    ///
    /// The identifier is passed through unvalidated. The whole exchange,
    /// including reading the body, is bounded by the configured timeout.
    pub async fn fetch_stop(&self, stop_id: &str) -> Result<StopSnapshot, ApiError> {
        let url = self.stop_url(stop_id);
        debug!(stop = stop_id, url = %url, "Fetching stop data");

        let response = tokio::time::timeout(self.timeout, self.transport.get(&url, &self.headers))
            .await
            .map_err(|_| ApiError::Connection(TransportError::Timeout))??;

        let body = classify_response(stop_id, response)?;
        let snapshot = parse_stop_body(&body)?;

        debug!(
            stop = stop_id,
            name = %snapshot.description,
            lines = snapshot.lines.len(),
            "Fetched stop data"
        );

        Ok(snapshot)
    }

    /// The transport strategy in use.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the client and its connection pool.
    ///
    /// A pool injected via [`StopClient::with_http`] stays alive for its
    /// other users.
    pub fn close(self) {
        drop(self);
    }
}

/// Check status and content type, returning the body if it should be JSON.
fn classify_response(stop_id: &str, response: RawResponse) -> Result<String, ApiError> {
    match response.status {
        200 => {}
        404 => return Err(ApiError::InvalidStop(stop_id.to_string())),
        403 => return Err(ApiError::Forbidden),
        status => return Err(ApiError::Status { status }),
    }

    let content_type = response.content_type.unwrap_or_default();
    if content_type.to_ascii_lowercase().contains("text/html") {
        if response.body.to_lowercase().contains(ACCESS_DENIED_MARKER) {
            return Err(ApiError::Blocked);
        }
        return Err(ApiError::ContentType { content_type });
    }

    Ok(response.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::error::ErrorKind;
    use std::sync::Mutex;

    /// What the fake transport answers with.
    enum Canned {
        Response(RawResponse),
        Timeout,
        Hang,
    }

    /// Transport that replays a canned answer and records requests.
    struct FakeTransport {
        canned: Canned,
        requests: Mutex<Vec<(String, HeaderMap)>>,
    }

    impl FakeTransport {
        fn new(canned: Canned) -> Self {
            Self {
                canned,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for FakeTransport {
        async fn get(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), headers.clone()));

            match &self.canned {
                Canned::Response(r) => Ok(r.clone()),
                Canned::Timeout => Err(TransportError::Timeout),
                Canned::Hang => std::future::pending().await,
            }
        }
    }

    fn client(canned: Canned) -> StopClient<FakeTransport> {
        let config = StopClientConfig::new().with_base_url("http://upstream.test/stops/");
        StopClient::with_transport(config, FakeTransport::new(canned)).unwrap()
    }

    const VALID_BODY: &str = r#"{
        "Description": "Viale Monza Via Sauro",
        "Lines": [
            {"Line": {"LineCode": "92", "LineDescription": "Bovisa FN - Viale Isonzo", "TransportMode": 1},
             "Direction": "0", "WaitMessage": "5 min"}
        ]
    }"#;

    #[test]
    fn config_builder() {
        let config = StopClientConfig::new()
            .with_base_url("http://localhost:8080")
            .with_timeout(5)
            .with_header_profile(HeaderProfile::chrome());

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.header_profile.name(), "chrome");
    }

    #[test]
    fn config_defaults() {
        let config = StopClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.header_profile, HeaderProfile::giromilano());
    }

    #[test]
    fn client_creation() {
        assert!(StopClient::new(StopClientConfig::new()).is_ok());
    }

    #[test]
    fn invalid_header_rejected() {
        let profile = HeaderProfile::giromilano().with_header("referer", "bad\nvalue");
        let config = StopClientConfig::new().with_header_profile(profile);
        let err = StopClient::new(config).unwrap_err();
        assert!(matches!(err, ApiError::Client(_)));
    }

    #[test]
    fn header_profiles() {
        let map = HeaderProfile::giromilano().to_header_map().unwrap();
        assert_eq!(map["accept"], "application/json, text/plain, */*");
        assert_eq!(map["accept-language"], "it-IT,it;q=0.9,en;q=0.8");
        assert_eq!(map["referer"], "https://giromilano.atm.it/");
        assert_eq!(map["origin"], "https://giromilano.atm.it");
        assert!(map.get("user-agent").is_none());

        let map = HeaderProfile::chrome().to_header_map().unwrap();
        assert!(map["user-agent"].to_str().unwrap().contains("Chrome"));
        assert_eq!(map["origin"], "https://giromilano.atm.it");

        assert_eq!(HeaderProfile::by_name("Chrome"), Some(HeaderProfile::chrome()));
        assert_eq!(HeaderProfile::by_name("curl"), None);
    }

    #[test]
    fn with_header_replaces() {
        let profile = HeaderProfile::giromilano().with_header("Accept", "application/json");
        let map = profile.to_header_map().unwrap();
        assert_eq!(map.get_all("accept").iter().count(), 1);
        assert_eq!(map["accept"], "application/json");
    }

    #[test]
    fn stop_url_template() {
        let client = client(Canned::Timeout);
        assert_eq!(client.stop_url("11471"), "http://upstream.test/stops/11471");
    }

    #[tokio::test]
    async fn fetch_success() {
        let client = client(Canned::Response(RawResponse::json(200, VALID_BODY)));

        let snapshot = client.fetch_stop("11471").await.unwrap();
        assert_eq!(snapshot.description, "Viale Monza Via Sauro");
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].line_code, "92");
        assert_eq!(snapshot.lines[0].wait_message.as_deref(), Some("5 min"));

        let requests = client.transport().requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "http://upstream.test/stops/11471");
        assert_eq!(requests[0].1["referer"], "https://giromilano.atm.it/");
    }

    #[tokio::test]
    async fn not_found_is_invalid_stop() {
        let client = client(Canned::Response(RawResponse::json(404, "")));
        let err = client.fetch_stop("999").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStop);
        assert_eq!(err.to_string(), "stop 999 not found");
    }

    #[tokio::test]
    async fn forbidden_is_connection_error() {
        let client = client(Canned::Response(RawResponse::html(403, "Forbidden")));
        let err = client.fetch_stop("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn other_status_is_api_error() {
        let client = client(Canned::Response(RawResponse::json(503, "{}")));
        let err = client.fetch_stop("1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn non_200_success_is_api_error() {
        let client = client(Canned::Response(RawResponse::json(204, "")));
        let err = client.fetch_stop("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 204 }));
    }

    #[tokio::test]
    async fn html_block_page_is_connection_error() {
        let body = "<html><head><title>Access Denied</title></head><body>Reference #18</body></html>";
        let client = client(Canned::Response(RawResponse::html(200, body)));
        let err = client.fetch_stop("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Blocked));
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[tokio::test]
    async fn html_marker_is_case_insensitive() {
        let body = "<p>ACCESS DENIED</p>";
        let client = client(Canned::Response(RawResponse::html(200, body)));
        let err = client.fetch_stop("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Blocked));
    }

    #[tokio::test]
    async fn other_html_is_content_type_error() {
        let client = client(Canned::Response(RawResponse::html(200, "<html>maintenance</html>")));
        let err = client.fetch_stop("1").await.unwrap_err();
        assert!(matches!(err, ApiError::ContentType { .. }));
        assert_eq!(err.kind(), ErrorKind::Api);
    }

    #[tokio::test]
    async fn malformed_json_is_api_error() {
        let client = client(Canned::Response(RawResponse::json(200, "{\"Description\":")));
        let err = client.fetch_stop("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Json(_)));
    }

    #[tokio::test]
    async fn missing_content_type_still_parses() {
        let response = RawResponse {
            status: 200,
            content_type: None,
            body: VALID_BODY.to_string(),
        };
        let client = client(Canned::Response(response));
        assert!(client.fetch_stop("1").await.is_ok());
    }

    #[tokio::test]
    async fn missing_field_is_api_error() {
        let client = client(Canned::Response(RawResponse::json(200, r#"{"Lines": []}"#)));
        let err = client.fetch_stop("1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert!(err.to_string().contains("Description"));
    }

    #[tokio::test]
    async fn transport_timeout_is_connection_error() {
        let client = client(Canned::Timeout);
        let err = client.fetch_stop("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(TransportError::Timeout)));
        assert!(err.is_transient());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_transport_times_out() {
        let client = client(Canned::Hang);
        let err = client.fetch_stop("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(TransportError::Timeout)));
    }

    #[tokio::test]
    async fn round_trip_to_parsed_wait() {
        use crate::domain::{WaitStatus, parse_wait_message};

        let body = r#"{"Description": "X", "Lines": [{"Line": {"LineCode": "3"}, "Direction": "1", "WaitMessage": "5 min"}]}"#;
        let client = client(Canned::Response(RawResponse::json(200, body)));
        let snapshot = client.fetch_stop("1").await.unwrap();
        assert_eq!(snapshot.description, "X");

        let parsed = parse_wait_message(snapshot.lines[0].wait_message.as_deref());
        assert_eq!(parsed.status, WaitStatus::Minutes);
        assert_eq!(parsed.wait_minutes, Some(5));
    }
}

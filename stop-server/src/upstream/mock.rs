//! Mock transport for running without the live upstream.
//!
//! Loads stop responses from JSON files and serves them as if they came
//! from the portal. Unknown stops get a 404.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::header::HeaderMap;
use tokio::sync::RwLock;

use super::error::{ApiError, TransportError};
use super::transport::{RawResponse, Transport};

/// Mock transport that serves stop responses from memory.
///
/// Useful for development and tests without hitting the bot-protected
/// upstream. Responses are keyed by the last path segment of the URL.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<RwLock<HashMap<String, RawResponse>>>,
    calls: Arc<AtomicUsize>,
    latency: Option<Duration>,
}

impl MockTransport {
    /// Create an empty mock; every stop is unknown until inserted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{stop_id}.json` files from a directory.
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, ApiError> {
        let data_dir = data_dir.as_ref();
        let mut responses = HashMap::new();

        let entries = std::fs::read_dir(data_dir).map_err(|e| {
            ApiError::Client(format!("failed to read mock data directory: {e}"))
        })?;

        for entry in entries {
            let entry = entry
                .map_err(|e| ApiError::Client(format!("failed to read directory entry: {e}")))?;

            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let Some(stop_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let body = std::fs::read_to_string(&path)
                .map_err(|e| ApiError::Client(format!("failed to read {path:?}: {e}")))?;

            responses.insert(stop_id.to_string(), RawResponse::json(200, body));
        }

        if responses.is_empty() {
            return Err(ApiError::Client(format!(
                "no mock stop files found in {data_dir:?}"
            )));
        }

        Ok(Self {
            responses: Arc::new(RwLock::new(responses)),
            ..Self::default()
        })
    }

    /// Delay every response, e.g. to exercise timeouts or overlapping polls.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Set the response for a stop.
    pub async fn insert(&self, stop_id: impl Into<String>, response: RawResponse) {
        self.responses.write().await.insert(stop_id.into(), response);
    }

    /// Forget a stop so that it answers 404.
    pub async fn remove(&self, stop_id: &str) {
        self.responses.write().await.remove(stop_id);
    }

    /// Stops with a configured response.
    pub async fn available_stops(&self) -> Vec<String> {
        let mut stops: Vec<String> = self.responses.read().await.keys().cloned().collect();
        stops.sort();
        stops
    }

    /// Number of requests served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    async fn get(&self, url: &str, _headers: &HeaderMap) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let stop_id = url.rsplit('/').next().unwrap_or_default();
        let response = self
            .responses
            .read()
            .await
            .get(stop_id)
            .cloned()
            .unwrap_or_else(|| RawResponse::json(404, r#"{"Message":"Not Found"}"#));

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{ErrorKind, StopClient, StopClientConfig};
    use tempfile::tempdir;

    #[tokio::test]
    async fn load_fixture_dir() {
        let transport = MockTransport::from_dir("data/mock_stops").unwrap();
        let stops = transport.available_stops().await;
        assert!(stops.contains(&"11471".to_string()));
    }

    #[test]
    fn empty_dir_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(MockTransport::from_dir(dir.path()).is_err());
    }

    #[tokio::test]
    async fn serves_files_by_stop_id() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("15398.json"),
            r#"{"Description": "Duomo M1 M3", "Lines": []}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let transport = MockTransport::from_dir(dir.path()).unwrap();
        assert_eq!(transport.available_stops().await, vec!["15398".to_string()]);

        let client = StopClient::with_transport(StopClientConfig::new(), transport.clone()).unwrap();
        let snapshot = client.fetch_stop("15398").await.unwrap();
        assert_eq!(snapshot.description, "Duomo M1 M3");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn unknown_stop_returns_not_found() {
        let transport = MockTransport::new();
        let client = StopClient::with_transport(StopClientConfig::new(), transport).unwrap();

        let err = client.fetch_stop("42").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStop);
    }

    #[tokio::test]
    async fn insert_and_remove() {
        let transport = MockTransport::new();
        transport
            .insert("7", RawResponse::html(200, "Access Denied"))
            .await;

        let client =
            StopClient::with_transport(StopClientConfig::new(), transport.clone()).unwrap();
        let err = client.fetch_stop("7").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);

        transport.remove("7").await;
        let err = client.fetch_stop("7").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStop);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn latency_beyond_timeout_is_connection_error() {
        let transport = MockTransport::new().with_latency(Duration::from_secs(30));
        transport
            .insert("1", RawResponse::json(200, r#"{"Description": "X", "Lines": []}"#))
            .await;

        let client =
            StopClient::with_transport(StopClientConfig::new().with_timeout(20), transport)
                .unwrap();
        let err = client.fetch_stop("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Connection(TransportError::Timeout)));
    }
}

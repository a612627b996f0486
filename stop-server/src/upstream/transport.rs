//! HTTP transport strategies.
//!
//! The client classifies responses independently of how they were fetched.
//! A [`Transport`] only performs the GET and hands back status, content type
//! and body. The default [`ReqwestTransport`] relies on header spoofing;
//! stronger browser impersonation can be plugged in behind the same trait.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap};

use super::error::TransportError;

/// Largest response body read from the upstream. Real stop payloads are a
/// few kilobytes.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// A fully read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    /// A response with a JSON content type.
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    /// A response with an HTML content type.
    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.into(),
        }
    }
}

/// Performs a single GET for the client.
///
/// Implementations must be safe to call concurrently and must not retry.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// Transport backed by a pooled `reqwest::Client`.
///
/// The pool is either built here (owned) or injected by the caller so that
/// several clients share connections. Either way it is released when the
/// last clone of the `reqwest::Client` is dropped.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with its own connection pool.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Use an existing (possibly shared) connection pool.
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &HeaderMap) -> Result<RawResponse, TransportError> {
        let response = self
            .http
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = read_body(response, MAX_BODY_BYTES).await?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Read the body chunk by chunk, giving up once it exceeds `limit` bytes.
async fn read_body(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<String, TransportError> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(TransportError::BodyTooLarge { limit });
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(TransportError::from_reqwest)? {
        if body.len() + chunk.len() > limit {
            return Err(TransportError::BodyTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

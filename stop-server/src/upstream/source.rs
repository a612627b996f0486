//! Abstraction over where stop snapshots come from.

use std::future::Future;

use crate::domain::StopSnapshot;

use super::client::StopClient;
use super::error::ApiError;
use super::transport::Transport;

/// Trait for fetching stop snapshots.
///
/// This abstraction lets the poller and setup flow run against any
/// transport, including the fixture-backed mock.
pub trait StopSource: Send + Sync + 'static {
    /// Fetch one stop. Never retries.
    fn fetch_stop(
        &self,
        stop_id: &str,
    ) -> impl Future<Output = Result<StopSnapshot, ApiError>> + Send;
}

impl<T: Transport + 'static> StopSource for StopClient<T> {
    fn fetch_stop(
        &self,
        stop_id: &str,
    ) -> impl Future<Output = Result<StopSnapshot, ApiError>> + Send {
        StopClient::fetch_stop(self, stop_id)
    }
}

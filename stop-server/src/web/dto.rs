//! Data transfer objects for web requests and responses.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::StopId;
use crate::poller::PollStatus;
use crate::registry::StopEntry;
use crate::sensors::SensorState;
use crate::upstream::StopSource;

pub use crate::setup::SetupInput as AddStopRequest;

/// A configured stop in the stop list.
#[derive(Debug, Serialize)]
pub struct StopSummary {
    pub stop_id: StopId,
    pub title: String,

    /// Seconds between polls
    pub scan_interval: u64,

    pub last_update_success: bool,

    /// Number of line sensors
    pub sensors: usize,
}

impl StopSummary {
    pub async fn from_entry<S: StopSource>(entry: &StopEntry<S>) -> Self {
        let status = entry.poller.status().await;
        Self {
            stop_id: entry.stop_id.clone(),
            title: entry.title.clone(),
            scan_interval: entry.scan_interval().secs(),
            last_update_success: status.last_update_success,
            sensors: entry.sensors.len(),
        }
    }
}

/// Response listing configured stops.
#[derive(Debug, Serialize)]
pub struct StopListResponse {
    pub stops: Vec<StopSummary>,
}

/// Full view of one stop.
#[derive(Debug, Serialize)]
pub struct StopView {
    pub stop_id: StopId,
    pub title: String,

    /// Name reported by the upstream on the last successful poll
    pub stop_name: Option<String>,

    pub scan_interval: u64,
    pub last_update_success: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,

    /// One state per line sensor
    pub sensors: Vec<SensorState>,
}

impl StopView {
    pub async fn from_entry<S: StopSource>(entry: &StopEntry<S>) -> Self {
        let PollStatus {
            stop_name,
            last_update_success,
            last_success_at,
            last_error,
            ..
        } = entry.poller.status().await;

        Self {
            stop_id: entry.stop_id.clone(),
            title: entry.title.clone(),
            stop_name,
            scan_interval: entry.scan_interval().secs(),
            last_update_success,
            last_success_at,
            last_error,
            sensors: entry.sensor_states().await,
        }
    }
}

/// Result of a manual refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub stop_id: StopId,

    /// `"updated"` or `"skipped"`
    pub outcome: &'static str,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,

    /// Machine-readable error code
    pub code: String,
}

//! Diagnostics dump for a configured stop.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{StopId, StopSnapshot};
use crate::registry::StopEntry;
use crate::upstream::StopSource;

#[derive(Debug, Serialize)]
pub struct Diagnostics {
    pub entry: EntryDiagnostics,
    pub poller: PollerDiagnostics,

    /// Last good snapshot, if still cached.
    pub data: Option<StopSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct EntryDiagnostics {
    pub stop_id: StopId,
    pub title: String,
    pub scan_interval: u64,
    pub sensors: usize,
}

#[derive(Debug, Serialize)]
pub struct PollerDiagnostics {
    pub stop_id: StopId,
    pub stop_name: Option<String>,
    pub last_update_success: bool,
    pub update_interval_seconds: u64,
    pub last_error: Option<String>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
}

/// Collect diagnostics for an entry.
pub async fn collect<S: StopSource>(entry: &StopEntry<S>) -> Diagnostics {
    let status = entry.poller.status().await;
    let interval = entry.scan_interval().secs();

    Diagnostics {
        entry: EntryDiagnostics {
            stop_id: entry.stop_id.clone(),
            title: entry.title.clone(),
            scan_interval: interval,
            sensors: entry.sensors.len(),
        },
        poller: PollerDiagnostics {
            stop_id: entry.poller.stop_id().clone(),
            stop_name: status.stop_name,
            last_update_success: status.last_update_success,
            update_interval_seconds: interval,
            last_error: status.last_error,
            last_success_at: status.last_success_at,
            consecutive_failures: status.consecutive_failures,
        },
        data: entry.poller.snapshot().await.map(|s| StopSnapshot::clone(&s)),
    }
}

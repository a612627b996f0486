//! Validation of a stop before it is configured.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{DomainError, ScanInterval, StopId};
use crate::error::ErrorChain;
use crate::upstream::{ErrorKind, StopSource};

/// User-supplied stop configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SetupInput {
    pub stop_id: String,

    /// Seconds between polls; defaults when absent.
    #[serde(default)]
    pub scan_interval: Option<u64>,
}

impl SetupInput {
    pub fn new(stop_id: impl Into<String>) -> Self {
        Self {
            stop_id: stop_id.into(),
            scan_interval: None,
        }
    }

    pub fn with_scan_interval(mut self, secs: u64) -> Self {
        self.scan_interval = Some(secs);
        self
    }
}

/// A stop that passed validation, ready to be set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedStop {
    pub stop_id: StopId,

    /// Display title: the stop description, or `"Stop {id}"`.
    pub title: String,

    pub scan_interval: ScanInterval,
}

/// Why a stop could not be configured.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    InvalidStopId(DomainError),

    #[error(transparent)]
    InvalidScanInterval(DomainError),

    #[error("stop {0} is already configured")]
    AlreadyConfigured(StopId),

    #[error("stop {0} does not exist")]
    InvalidStop(StopId),

    #[error("cannot connect to stop API: {0}")]
    CannotConnect(String),

    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl SetupError {
    /// Stable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            SetupError::InvalidStopId(_) => "invalid_stop_id",
            SetupError::InvalidScanInterval(_) => "invalid_scan_interval",
            SetupError::AlreadyConfigured(_) => "already_configured",
            SetupError::InvalidStop(_) => "invalid_stop",
            SetupError::CannotConnect(_) => "cannot_connect",
            SetupError::Unknown(_) => "unknown",
        }
    }
}

/// Validate a stop against the live upstream.
///
/// Checks run in order: id format, scan interval, duplicates, then a single
/// fetch. `is_configured` reports whether a stop already has an entry.
pub async fn validate_stop<S: StopSource>(
    source: &S,
    input: &SetupInput,
    is_configured: impl Fn(&StopId) -> bool,
) -> Result<ValidatedStop, SetupError> {
    let stop_id = StopId::parse(&input.stop_id).map_err(SetupError::InvalidStopId)?;

    let scan_interval = match input.scan_interval {
        Some(secs) => ScanInterval::new(secs).map_err(SetupError::InvalidScanInterval)?,
        None => ScanInterval::default(),
    };

    if is_configured(&stop_id) {
        return Err(SetupError::AlreadyConfigured(stop_id));
    }

    let snapshot = match source.fetch_stop(stop_id.as_str()).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            return Err(match e.kind() {
                ErrorKind::InvalidStop => SetupError::InvalidStop(stop_id),
                ErrorKind::Connection => SetupError::CannotConnect(ErrorChain(&e).to_string()),
                ErrorKind::Api => {
                    let message = ErrorChain(&e).to_string();
                    error!(stop = %stop_id, error = %message, "Unexpected error validating stop");
                    SetupError::Unknown(message)
                }
            });
        }
    };

    let title = if snapshot.description.is_empty() {
        stop_id.fallback_name()
    } else {
        snapshot.description
    };

    info!(stop = %stop_id, title = %title, "Validated stop");

    Ok(ValidatedStop {
        stop_id,
        title,
        scan_interval,
    })
}

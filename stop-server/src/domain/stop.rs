//! Stop identifier and polling interval types.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::error::DomainError;

/// Maximum length of a stop identifier.
const MAX_STOP_ID_LEN: usize = 10;

/// Default seconds between polls of a stop.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 60;

/// Shortest accepted polling interval.
pub const MIN_SCAN_INTERVAL_SECS: u64 = 15;

/// Longest accepted polling interval.
pub const MAX_SCAN_INTERVAL_SECS: u64 = 120;

/// A validated upstream stop identifier.
///
/// Stop identifiers are 1 to 10 ASCII digits. The upstream client treats
/// identifiers as opaque strings; this type is what configuration hands
/// to the poller once the user's input has been checked.
///
/// # Examples
///
/// ```
/// use stop_server::domain::StopId;
///
/// let stop = StopId::parse(" 11471 ").unwrap();
/// assert_eq!(stop.as_str(), "11471");
///
/// assert!(StopId::parse("").is_err());
/// assert!(StopId::parse("12a").is_err());
/// assert!(StopId::parse("12345678901").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StopId(String);

impl StopId {
    /// Parse a stop identifier, ignoring surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(DomainError::InvalidStopId("must not be empty"));
        }

        if s.len() > MAX_STOP_ID_LEN {
            return Err(DomainError::InvalidStopId("must be at most 10 digits"));
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::InvalidStopId("must contain only digits"));
        }

        Ok(StopId(s.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fallback display name used when the upstream gives no description.
    pub fn fallback_name(&self) -> String {
        format!("Stop {}", self.0)
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seconds between two polls of the same stop, within 15-120.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScanInterval(u64);

impl ScanInterval {
    /// Create a scan interval, rejecting values outside the accepted bounds.
    pub fn new(secs: u64) -> Result<Self, DomainError> {
        if !(MIN_SCAN_INTERVAL_SECS..=MAX_SCAN_INTERVAL_SECS).contains(&secs) {
            return Err(DomainError::ScanIntervalOutOfRange(secs));
        }
        Ok(ScanInterval(secs))
    }

    pub fn secs(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for ScanInterval {
    fn default() -> Self {
        ScanInterval(DEFAULT_SCAN_INTERVAL_SECS)
    }
}

//! Domain types for stop monitoring.
//!
//! These types are validated by construction and independent of the
//! upstream JSON format.

mod error;
mod snapshot;
mod stop;
mod transport;
mod wait;

pub use error::DomainError;
pub use snapshot::{LineKey, LineStatus, StopSnapshot};
pub use stop::{
    DEFAULT_SCAN_INTERVAL_SECS, MAX_SCAN_INTERVAL_SECS, MIN_SCAN_INTERVAL_SECS, ScanInterval,
    StopId,
};
pub use transport::TransportType;
pub use wait::{DisplayValue, MINUTES_UNIT, ParsedWait, WaitStatus, parse_wait_message};

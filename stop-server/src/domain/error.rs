//! Domain error types.
//!
//! These errors represent validation failures of user-supplied
//! configuration. They are distinct from upstream/IO errors.

use super::stop::{MAX_SCAN_INTERVAL_SECS, MIN_SCAN_INTERVAL_SECS};

/// Domain-level validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Stop identifier is not 1-10 ASCII digits
    #[error("invalid stop id: {0}")]
    InvalidStopId(&'static str),

    /// Scan interval outside the accepted bounds
    #[error(
        "scan interval {0}s out of range ({MIN_SCAN_INTERVAL_SECS}-{MAX_SCAN_INTERVAL_SECS}s)"
    )]
    ScanIntervalOutOfRange(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidStopId("must not be empty");
        assert_eq!(err.to_string(), "invalid stop id: must not be empty");

        let err = DomainError::ScanIntervalOutOfRange(5);
        assert_eq!(err.to_string(), "scan interval 5s out of range (15-120s)");
    }
}

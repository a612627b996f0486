//! GiroMilano stop API client.
//!
//! This module provides an HTTP client for ATM Milano's stop-status
//! endpoint, which reports the lines serving a stop and the wait until
//! the next vehicle on each.
//!
//! Key characteristics of the upstream:
//! - It is protected by a bot filter that rejects requests lacking
//!   browser-like headers, answering 403 or an HTML "Access Denied" page
//! - Unknown stops answer 404
//! - Field types are loose (numbers and strings are used interchangeably)

mod client;
mod convert;
mod error;
mod mock;
mod source;
mod transport;
mod types;

pub use client::{
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, HeaderProfile, StopClient, StopClientConfig,
};
pub use convert::{convert_stop_response, parse_stop_body, validate_payload};
pub use error::{ApiError, ErrorKind, TransportError};
pub use mock::MockTransport;
pub use source::StopSource;
pub use transport::{MAX_BODY_BYTES, RawResponse, ReqwestTransport, Transport};
pub use types::{LineEntry, LineInfo, StopResponse};

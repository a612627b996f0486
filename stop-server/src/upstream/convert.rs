//! Validation and conversion of stop responses into domain types.

use serde_json::Value;

use crate::domain::{LineStatus, StopSnapshot};

use super::error::ApiError;
use super::types::{DESCRIPTION_FIELD, LINES_FIELD, LineEntry, StopResponse};

/// Direction assumed when an entry carries none.
const DEFAULT_DIRECTION: &str = "0";

/// Parse a response body into a snapshot.
///
/// Fails if the body is not JSON, is not an object, or lacks either of the
/// top-level `Description` and `Lines` fields.
pub fn parse_stop_body(body: &str) -> Result<StopSnapshot, ApiError> {
    let value: Value = serde_json::from_str(body).map_err(ApiError::Json)?;
    let response = validate_payload(value)?;
    Ok(convert_stop_response(response))
}

/// Check the payload shape and deserialize it.
pub fn validate_payload(value: Value) -> Result<StopResponse, ApiError> {
    let Value::Object(fields) = &value else {
        return Err(ApiError::InvalidPayload(
            "expected a JSON object".to_string(),
        ));
    };

    for field in [DESCRIPTION_FIELD, LINES_FIELD] {
        if !fields.contains_key(field) {
            return Err(ApiError::InvalidPayload(format!(
                "missing '{field}' field"
            )));
        }
    }

    serde_json::from_value(value).map_err(|e| ApiError::InvalidPayload(e.to_string()))
}

/// Convert a validated response to a snapshot.
///
/// Missing sub-fields become empty strings or `None` rather than errors.
pub fn convert_stop_response(response: StopResponse) -> StopSnapshot {
    let lines = response
        .lines
        .unwrap_or_default()
        .into_iter()
        .map(convert_line_entry)
        .collect();

    StopSnapshot {
        description: response.description.unwrap_or_default(),
        lines,
    }
}

fn convert_line_entry(entry: LineEntry) -> LineStatus {
    let (line_code, line_description, transport_mode) = match entry.line {
        Some(info) => (
            info.line_code.unwrap_or_default(),
            info.line_description.unwrap_or_default(),
            info.transport_mode,
        ),
        None => (String::new(), String::new(), None),
    };

    LineStatus {
        line_code,
        line_description,
        direction: entry
            .direction
            .unwrap_or_else(|| DEFAULT_DIRECTION.to_string()),
        transport_mode,
        wait_message: entry.wait_message,
    }
}

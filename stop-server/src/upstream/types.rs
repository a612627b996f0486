//! Stop API response DTOs.
//!
//! These types map directly to the GiroMilano stop JSON. The upstream is
//! loose about types (directions and line codes arrive as strings or
//! numbers) and omits fields freely, so every field is optional and
//! parsed leniently.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Top-level field holding the stop's display name.
pub const DESCRIPTION_FIELD: &str = "Description";

/// Top-level field holding the line entries.
pub const LINES_FIELD: &str = "Lines";

/// Response from `GET .../pois/stops/{stop_id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StopResponse {
    /// Display name of the stop, e.g. "Viale Monza Via Sauro".
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,

    /// Lines serving the stop, one entry per line and direction.
    #[serde(default)]
    pub lines: Option<Vec<LineEntry>>,
}

/// One line/direction entry at the stop.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineEntry {
    /// Static line information.
    #[serde(default)]
    pub line: Option<LineInfo>,

    /// Direction tag, "0" or "1". Sometimes sent as a number.
    #[serde(default, deserialize_with = "lenient_string")]
    pub direction: Option<String>,

    /// Time until the next vehicle, e.g. "3 min", "in arrivo".
    #[serde(default, deserialize_with = "lenient_string")]
    pub wait_message: Option<String>,
}

/// Line information nested under each entry's `Line` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub line_code: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub line_description: Option<String>,

    #[serde(default, deserialize_with = "lenient_u32")]
    pub transport_mode: Option<u32>,
}

/// Accept a string or number; anything else becomes `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Accept a non-negative integer or a numeric string; anything else becomes `None`.
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_response() {
        let json = r#"{
            "Code": "11471",
            "Description": "Viale Monza Via Sauro",
            "Lines": [
                {
                    "Line": {
                        "LineCode": "92",
                        "LineDescription": "Bovisa FN - Viale Isonzo",
                        "TransportMode": 1
                    },
                    "Direction": "0",
                    "WaitMessage": "4 min"
                }
            ]
        }"#;

        let response: StopResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.description.as_deref(),
            Some("Viale Monza Via Sauro")
        );

        let lines = response.lines.unwrap();
        assert_eq!(lines.len(), 1);
        let line = lines[0].line.as_ref().unwrap();
        assert_eq!(line.line_code.as_deref(), Some("92"));
        assert_eq!(line.transport_mode, Some(1));
        assert_eq!(lines[0].direction.as_deref(), Some("0"));
        assert_eq!(lines[0].wait_message.as_deref(), Some("4 min"));
    }

    #[test]
    fn numeric_fields_are_stringified() {
        let json = r#"{
            "Description": "X",
            "Lines": [{"Line": {"LineCode": 54, "TransportMode": "2"}, "Direction": 1}]
        }"#;

        let response: StopResponse = serde_json::from_str(json).unwrap();
        let lines = response.lines.unwrap();
        let info = lines[0].line.as_ref().unwrap();
        assert_eq!(info.line_code.as_deref(), Some("54"));
        assert_eq!(info.transport_mode, Some(2));
        assert_eq!(lines[0].direction.as_deref(), Some("1"));
    }

    #[test]
    fn missing_and_null_fields() {
        let json = r#"{
            "Description": null,
            "Lines": [{"Line": null, "WaitMessage": null}, {}]
        }"#;

        let response: StopResponse = serde_json::from_str(json).unwrap();
        assert!(response.description.is_none());

        let lines = response.lines.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].line.is_none());
        assert!(lines[0].wait_message.is_none());
        assert!(lines[1].direction.is_none());
    }

    #[test]
    fn odd_transport_modes_are_dropped() {
        let json = r#"{"LineCode": "1", "TransportMode": -3}"#;
        let info: LineInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.transport_mode, None);

        let json = r#"{"LineCode": "1", "TransportMode": {"id": 1}}"#;
        let info: LineInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.transport_mode, None);
    }
}

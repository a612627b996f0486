//! Wait message parsing.
//!
//! The upstream reports the time until the next vehicle as free text: a
//! minute count ("2 min", "15 min") or one of a few Italian status phrases.
//! [`parse_wait_message`] classifies that text into a [`ParsedWait`].

use std::fmt;

use serde::Serialize;

/// Unit reported alongside a minute count.
pub const MINUTES_UNIT: &str = "min";

/// Display value used when the upstream sent no wait message at all.
const UNKNOWN_DISPLAY: &str = "unknown";

/// Vehicle is arriving now.
const PHRASE_ARRIVING: &str = "in arrivo";

/// Prediction is being recalculated.
const PHRASE_RECALCULATING: &str = "ricalcolo";

/// Run has been cancelled.
const PHRASE_CANCELLED: &str = "soppressa";

/// Classification of a wait message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitStatus {
    Minutes,
    Arriving,
    Recalculating,
    Cancelled,
    UnknownText,
}

impl WaitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitStatus::Minutes => "minutes",
            WaitStatus::Arriving => "arriving",
            WaitStatus::Recalculating => "recalculating",
            WaitStatus::Cancelled => "cancelled",
            WaitStatus::UnknownText => "unknown_text",
        }
    }
}

impl fmt::Display for WaitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value shown as a sensor's state: a minute count or a status string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Minutes(u32),
    Text(String),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Minutes(n) => write!(f, "{n}"),
            DisplayValue::Text(s) => f.write_str(s),
        }
    }
}

/// A wait message after classification.
///
/// Derived fresh from every fetch; there is no identity beyond the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedWait {
    /// Trimmed original text, empty if the message was absent.
    pub raw_text: String,
    pub display_value: DisplayValue,
    /// Minutes until arrival; `Some(0)` only for the arriving phrase.
    pub wait_minutes: Option<u32>,
    pub status: WaitStatus,
    pub unit: Option<&'static str>,
}

impl ParsedWait {
    fn text(raw_text: &str, wait_minutes: Option<u32>, status: WaitStatus) -> Self {
        Self {
            raw_text: raw_text.to_string(),
            display_value: DisplayValue::Text(raw_text.to_string()),
            wait_minutes,
            status,
            unit: None,
        }
    }
}

/// Classify an upstream wait message.
///
/// Total and pure: anything unrecognised comes back as
/// [`WaitStatus::UnknownText`] carrying the trimmed input.
///
/// # Examples
///
/// ```
/// use stop_server::domain::{parse_wait_message, WaitStatus};
///
/// let parsed = parse_wait_message(Some(" 4 MIN "));
/// assert_eq!(parsed.status, WaitStatus::Minutes);
/// assert_eq!(parsed.wait_minutes, Some(4));
///
/// let parsed = parse_wait_message(Some("In Arrivo"));
/// assert_eq!(parsed.status, WaitStatus::Arriving);
/// assert_eq!(parsed.wait_minutes, Some(0));
/// ```
pub fn parse_wait_message(message: Option<&str>) -> ParsedWait {
    let Some(message) = message else {
        return ParsedWait {
            raw_text: String::new(),
            display_value: DisplayValue::Text(UNKNOWN_DISPLAY.to_string()),
            wait_minutes: None,
            status: WaitStatus::UnknownText,
            unit: None,
        };
    };

    let raw_text = message.trim();

    // Numeric form is checked before any phrase.
    if let Some(minutes) = leading_minutes(raw_text) {
        return ParsedWait {
            raw_text: raw_text.to_string(),
            display_value: DisplayValue::Minutes(minutes),
            wait_minutes: Some(minutes),
            status: WaitStatus::Minutes,
            unit: Some(MINUTES_UNIT),
        };
    }

    let lower = raw_text.to_lowercase();
    match lower.as_str() {
        PHRASE_ARRIVING => ParsedWait::text(raw_text, Some(0), WaitStatus::Arriving),
        PHRASE_RECALCULATING => ParsedWait::text(raw_text, None, WaitStatus::Recalculating),
        PHRASE_CANCELLED => ParsedWait::text(raw_text, None, WaitStatus::Cancelled),
        _ => ParsedWait::text(raw_text, None, WaitStatus::UnknownText),
    }
}

/// Match `\s*(\d+)\s*min` (case-insensitive) at the start of `text`.
///
/// Anything may follow "min". Counts past `u32::MAX` saturate.
fn leading_minutes(text: &str) -> Option<u32> {
    let text = text.trim_start();
    let digits_end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    if digits_end == 0 {
        return None;
    }

    let (digits, rest) = text.split_at(digits_end);
    let rest = rest.trim_start().as_bytes();
    if rest.len() < MINUTES_UNIT.len()
        || !rest[..MINUTES_UNIT.len()].eq_ignore_ascii_case(MINUTES_UNIT.as_bytes())
    {
        return None;
    }

    let minutes = digits.bytes().fold(0u32, |acc, digit| {
        acc.saturating_mul(10).saturating_add(u32::from(digit - b'0'))
    });
    Some(minutes)
}

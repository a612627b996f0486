//! Stop snapshot types.
//!
//! A [`StopSnapshot`] is everything one successful fetch tells us about a
//! stop: its display name and the lines currently serving it.

use serde::Serialize;

/// Identity of a line at a stop: `(line_code, direction)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LineKey {
    pub line_code: String,
    pub direction: String,
}

/// One line/direction pairing at a stop at fetch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineStatus {
    /// Line code, e.g. "92" or "M1".
    pub line_code: String,

    /// Line description, e.g. "P.za Bausan - P.le Negrelli". May be empty.
    pub line_description: String,

    /// Direction tag, usually "0" or "1".
    pub direction: String,

    /// Upstream transport mode category, when reported.
    pub transport_mode: Option<u32>,

    /// Raw wait message, e.g. "2 min" or "in arrivo".
    pub wait_message: Option<String>,
}

impl LineStatus {
    pub fn key(&self) -> LineKey {
        LineKey {
            line_code: self.line_code.clone(),
            direction: self.direction.clone(),
        }
    }

    /// Whether this entry belongs to the given line/direction.
    pub fn matches(&self, key: &LineKey) -> bool {
        self.line_code == key.line_code && self.direction == key.direction
    }
}

/// Result of a successful stop fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopSnapshot {
    /// Display name of the stop. Empty if the upstream sent none.
    pub description: String,

    /// Lines in upstream order. May contain duplicate keys.
    pub lines: Vec<LineStatus>,
}

impl StopSnapshot {
    /// First line entry matching the key.
    pub fn find_line(&self, key: &LineKey) -> Option<&LineStatus> {
        self.lines.iter().find(|line| line.matches(key))
    }
}

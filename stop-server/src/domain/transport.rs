//! Transport type classification.

use std::fmt;

use serde::Serialize;

/// Vehicle category of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    Bus,
    Tram,
    Metro,
    Trolleybus,
    Unknown,
}

const METRO_LINES: &[&str] = &["M1", "M2", "M3", "M4", "M5", "ML"];

const TRAM_LINES: &[&str] = &[
    "1", "2", "3", "4", "5", "7", "9", "10", "12", "14", "15", "16", "19", "23", "24", "27", "28",
    "29", "30", "31", "33",
];

const TROLLEYBUS_LINES: &[&str] = &["90", "91", "92"];

impl TransportType {
    /// Classify a line by its code.
    ///
    /// Lines not in the metro/tram/trolleybus tables are surface buses.
    pub fn for_line(line_code: &str) -> Self {
        let code = line_code.trim();
        if code.is_empty() {
            TransportType::Unknown
        } else if METRO_LINES.iter().any(|m| m.eq_ignore_ascii_case(code)) {
            TransportType::Metro
        } else if TRAM_LINES.contains(&code) {
            TransportType::Tram
        } else if TROLLEYBUS_LINES.contains(&code) {
            TransportType::Trolleybus
        } else {
            TransportType::Bus
        }
    }

    /// Material Design icon for this vehicle type.
    pub fn icon(&self) -> &'static str {
        match self {
            TransportType::Bus => "mdi:bus",
            TransportType::Tram => "mdi:tram",
            TransportType::Metro => "mdi:subway",
            TransportType::Trolleybus => "mdi:bus-electric",
            TransportType::Unknown => "mdi:bus",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportType::Bus => "bus",
            TransportType::Tram => "tram",
            TransportType::Metro => "metro",
            TransportType::Trolleybus => "trolleybus",
            TransportType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_lines() {
        assert_eq!(TransportType::for_line("M1"), TransportType::Metro);
        assert_eq!(TransportType::for_line("ml"), TransportType::Metro);
        assert_eq!(TransportType::for_line("2"), TransportType::Tram);
        assert_eq!(TransportType::for_line("33"), TransportType::Tram);
        assert_eq!(TransportType::for_line("92"), TransportType::Trolleybus);
        assert_eq!(TransportType::for_line("54"), TransportType::Bus);
        assert_eq!(TransportType::for_line("N25"), TransportType::Bus);
        assert_eq!(TransportType::for_line(""), TransportType::Unknown);
    }

    #[test]
    fn icons() {
        assert_eq!(TransportType::Tram.icon(), "mdi:tram");
        assert_eq!(TransportType::Metro.icon(), "mdi:subway");
        assert_eq!(TransportType::Trolleybus.icon(), "mdi:bus-electric");
        assert_eq!(TransportType::Unknown.icon(), "mdi:bus");
    }
}

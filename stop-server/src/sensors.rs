//! Per-line sensor projection.
//!
//! A stop exposes one sensor per `(line_code, direction)` pair found in its
//! first snapshot. Every later snapshot is projected onto those sensors by
//! re-parsing the matching line's wait message.

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{
    DisplayValue, LineKey, LineStatus, StopId, StopSnapshot, TransportType, WaitStatus,
    parse_wait_message,
};

/// One line/direction at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineSensor {
    /// `"{stop}_{line}_{direction}"`
    pub unique_id: String,

    /// `"{line} – {description}"`, or just the line code.
    pub name: String,

    pub key: LineKey,

    pub line_description: String,

    pub transport_mode: Option<u32>,

    pub transport_type: TransportType,
}

/// Attributes reported alongside a sensor's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorAttributes {
    pub line_code: String,
    pub line_description: String,
    pub wait_text: Option<String>,
    pub wait_minutes: Option<u32>,
    pub status: Option<WaitStatus>,
}

/// A sensor's state derived from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorState {
    pub unique_id: String,
    pub name: String,
    pub available: bool,
    pub value: Option<DisplayValue>,
    pub unit: Option<&'static str>,
    pub icon: &'static str,
    pub attributes: SensorAttributes,
}

/// Build sensors for a snapshot, one per `(line_code, direction)`.
///
/// Duplicate keys keep their first occurrence; input order is preserved.
pub fn line_sensors(stop_id: &StopId, snapshot: &StopSnapshot) -> Vec<LineSensor> {
    let mut seen = HashSet::new();
    snapshot
        .lines
        .iter()
        .filter(|line| seen.insert(line.key()))
        .map(|line| LineSensor::new(stop_id, line))
        .collect()
}

impl LineSensor {
    pub fn new(stop_id: &StopId, line: &LineStatus) -> Self {
        let name = if line.line_description.is_empty() {
            line.line_code.clone()
        } else {
            format!("{} – {}", line.line_code, line.line_description)
        };

        Self {
            unique_id: format!("{}_{}_{}", stop_id, line.line_code, line.direction),
            name,
            key: line.key(),
            line_description: line.line_description.clone(),
            transport_mode: line.transport_mode,
            transport_type: TransportType::for_line(&line.line_code),
        }
    }

    /// Icon for the sensor; only buses vary with the wait status.
    pub fn icon(&self, status: Option<WaitStatus>) -> &'static str {
        match (self.transport_type, status) {
            (TransportType::Bus, Some(WaitStatus::Arriving)) => "mdi:bus-stop",
            (TransportType::Bus, Some(WaitStatus::Recalculating)) => "mdi:bus-clock",
            (TransportType::Bus, Some(WaitStatus::Cancelled)) => "mdi:bus-alert",
            (transport_type, _) => transport_type.icon(),
        }
    }

    /// Project a snapshot onto this sensor.
    ///
    /// The sensor is unavailable when the last update failed, when there is
    /// no snapshot, or when its line is missing from the snapshot.
    pub fn state(&self, snapshot: Option<&StopSnapshot>, last_update_success: bool) -> SensorState {
        let parsed = snapshot
            .and_then(|s| s.find_line(&self.key))
            .filter(|_| last_update_success)
            .map(|line| parse_wait_message(line.wait_message.as_deref()));

        let status = parsed.as_ref().map(|p| p.status);

        let attributes = SensorAttributes {
            line_code: self.key.line_code.clone(),
            line_description: self.line_description.clone(),
            wait_text: parsed.as_ref().map(|p| p.raw_text.clone()),
            wait_minutes: parsed.as_ref().and_then(|p| p.wait_minutes),
            status,
        };

        SensorState {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            available: parsed.is_some(),
            value: parsed.as_ref().map(|p| p.display_value.clone()),
            unit: parsed.as_ref().and_then(|p| p.unit),
            icon: self.icon(status),
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop() -> StopId {
        StopId::parse("11471").unwrap()
    }

    fn line(code: &str, description: &str, direction: &str, wait: Option<&str>) -> LineStatus {
        LineStatus {
            line_code: code.to_string(),
            line_description: description.to_string(),
            direction: direction.to_string(),
            transport_mode: None,
            wait_message: wait.map(str::to_string),
        }
    }

    fn snapshot(lines: Vec<LineStatus>) -> StopSnapshot {
        StopSnapshot {
            description: "Viale Monza Via Sauro".to_string(),
            lines,
        }
    }

    #[test]
    fn duplicates_keep_first() {
        let snap = snapshot(vec![
            line("92", "Bovisa FN - Viale Isonzo", "0", Some("2 min")),
            line("92", "Other description", "0", Some("9 min")),
            line("92", "Bovisa FN - Viale Isonzo", "1", Some("4 min")),
        ]);

        let sensors = line_sensors(&stop(), &snap);
        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors[0].unique_id, "11471_92_0");
        assert_eq!(sensors[0].line_description, "Bovisa FN - Viale Isonzo");
        assert_eq!(sensors[1].unique_id, "11471_92_1");

        let state = sensors[0].state(Some(&snap), true);
        assert_eq!(state.value, Some(DisplayValue::Minutes(2)));
    }

    #[test]
    fn names() {
        let with_description = LineSensor::new(&stop(), &line("2", "P.za Bausan - P.le Negrelli", "0", None));
        assert_eq!(with_description.name, "2 – P.za Bausan - P.le Negrelli");

        let bare = LineSensor::new(&stop(), &line("44", "", "1", None));
        assert_eq!(bare.name, "44");
    }

    #[test]
    fn state_for_minutes() {
        let snap = snapshot(vec![line("54", "Lambrate - Loreto", "1", Some("6 min"))]);
        let sensor = &line_sensors(&stop(), &snap)[0];

        let state = sensor.state(Some(&snap), true);
        assert!(state.available);
        assert_eq!(state.value, Some(DisplayValue::Minutes(6)));
        assert_eq!(state.unit, Some("min"));
        assert_eq!(state.icon, "mdi:bus");
        assert_eq!(state.attributes.line_code, "54");
        assert_eq!(state.attributes.wait_text.as_deref(), Some("6 min"));
        assert_eq!(state.attributes.wait_minutes, Some(6));
        assert_eq!(state.attributes.status, Some(WaitStatus::Minutes));
    }

    #[test]
    fn state_recomputed_from_new_snapshot() {
        let first = snapshot(vec![line("54", "", "1", Some("6 min"))]);
        let sensor = &line_sensors(&stop(), &first)[0];

        let second = snapshot(vec![line("54", "", "1", Some("In Arrivo"))]);
        let state = sensor.state(Some(&second), true);
        assert_eq!(state.value, Some(DisplayValue::Text("In Arrivo".into())));
        assert_eq!(state.unit, None);
        assert_eq!(state.attributes.wait_minutes, Some(0));
        assert_eq!(state.icon, "mdi:bus-stop");
    }

    #[test]
    fn missing_line_is_unavailable() {
        let first = snapshot(vec![line("54", "", "1", Some("6 min"))]);
        let sensor = &line_sensors(&stop(), &first)[0];

        let second = snapshot(vec![line("54", "", "0", Some("3 min"))]);
        let state = sensor.state(Some(&second), true);
        assert!(!state.available);
        assert_eq!(state.value, None);
        assert_eq!(state.attributes.status, None);
    }

    #[test]
    fn failed_update_is_unavailable() {
        let snap = snapshot(vec![line("54", "", "1", Some("6 min"))]);
        let sensor = &line_sensors(&stop(), &snap)[0];

        assert!(!sensor.state(Some(&snap), false).available);
        assert!(!sensor.state(None, true).available);
    }

    #[test]
    fn absent_wait_message() {
        let snap = snapshot(vec![line("44", "", "0", None)]);
        let sensor = &line_sensors(&stop(), &snap)[0];

        let state = sensor.state(Some(&snap), true);
        assert!(state.available);
        assert_eq!(state.value, Some(DisplayValue::Text("unknown".into())));
        assert_eq!(state.attributes.wait_text.as_deref(), Some(""));
        assert_eq!(state.attributes.status, Some(WaitStatus::UnknownText));
    }

    #[test]
    fn icons_by_type_and_status() {
        let bus = LineSensor::new(&stop(), &line("54", "", "0", None));
        assert_eq!(bus.icon(Some(WaitStatus::Minutes)), "mdi:bus");
        assert_eq!(bus.icon(Some(WaitStatus::Recalculating)), "mdi:bus-clock");
        assert_eq!(bus.icon(Some(WaitStatus::Cancelled)), "mdi:bus-alert");
        assert_eq!(bus.icon(None), "mdi:bus");

        let tram = LineSensor::new(&stop(), &line("2", "", "0", None));
        assert_eq!(tram.icon(Some(WaitStatus::Arriving)), "mdi:tram");

        let metro = LineSensor::new(&stop(), &line("M3", "", "0", None));
        assert_eq!(metro.icon(Some(WaitStatus::Cancelled)), "mdi:subway");
    }
}

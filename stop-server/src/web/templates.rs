//! Askama templates for the web frontend.

use askama::Template;

use crate::domain::DisplayValue;
use crate::sensors::SensorState;

use super::dto::{StopSummary, StopView};

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// Home page listing configured stops.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub stops: Vec<StopRow>,
}

/// One stop's wait times.
#[derive(Template)]
#[template(path = "stop.html")]
pub struct StopTemplate {
    pub stop_id: String,
    pub title: String,
    pub scan_interval: u64,
    pub healthy: bool,
    pub last_error: Option<String>,
    pub last_success: String,
    pub lines: Vec<LineRow>,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// Stop row on the index page.
#[derive(Debug, Clone)]
pub struct StopRow {
    pub stop_id: String,
    pub title: String,
    pub scan_interval: u64,
    pub healthy: bool,
    pub sensors: usize,
}

impl StopRow {
    pub fn from_summary(summary: &StopSummary) -> Self {
        Self {
            stop_id: summary.stop_id.to_string(),
            title: summary.title.clone(),
            scan_interval: summary.scan_interval,
            healthy: summary.last_update_success,
            sensors: summary.sensors,
        }
    }
}

/// Line row on a stop page.
#[derive(Debug, Clone)]
pub struct LineRow {
    pub name: String,
    pub icon: String,
    pub available: bool,

    /// Formatted wait, e.g. "4 min" or "in arrivo"
    pub wait: String,

    /// CSS class for the wait status
    pub status: String,
}

impl LineRow {
    pub fn from_state(state: &SensorState) -> Self {
        let wait = match (&state.value, state.unit) {
            (Some(DisplayValue::Minutes(m)), Some(unit)) => format!("{m} {unit}"),
            (Some(value), _) => value.to_string(),
            (None, _) => "unavailable".to_string(),
        };

        let status = state
            .attributes
            .status
            .map(|s| s.as_str().replace('_', "-"))
            .unwrap_or_else(|| "unavailable".to_string());

        Self {
            name: state.name.clone(),
            icon: state.icon.to_string(),
            available: state.available,
            wait,
            status,
        }
    }
}

impl StopTemplate {
    pub fn from_view(view: &StopView) -> Self {
        Self {
            stop_id: view.stop_id.to_string(),
            title: view.title.clone(),
            scan_interval: view.scan_interval,
            healthy: view.last_update_success,
            last_error: view.last_error.clone(),
            last_success: view
                .last_success_at
                .map(|t| t.format("%H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "never".to_string()),
            lines: view.sensors.iter().map(LineRow::from_state).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WaitStatus;
    use crate::sensors::SensorAttributes;

    fn state(value: Option<DisplayValue>, status: Option<WaitStatus>) -> SensorState {
        SensorState {
            unique_id: "11471_92_0".to_string(),
            name: "92 – Bovisa FN - Viale Isonzo".to_string(),
            available: value.is_some(),
            unit: match value {
                Some(DisplayValue::Minutes(_)) => Some("min"),
                _ => None,
            },
            value,
            icon: "mdi:bus",
            attributes: SensorAttributes {
                line_code: "92".to_string(),
                line_description: "Bovisa FN - Viale Isonzo".to_string(),
                wait_text: None,
                wait_minutes: None,
                status,
            },
        }
    }

    #[test]
    fn line_row_formats_wait() {
        let row = LineRow::from_state(&state(
            Some(DisplayValue::Minutes(4)),
            Some(WaitStatus::Minutes),
        ));
        assert_eq!(row.wait, "4 min");
        assert_eq!(row.status, "minutes");

        let row = LineRow::from_state(&state(
            Some(DisplayValue::Text("in arrivo".into())),
            Some(WaitStatus::Arriving),
        ));
        assert_eq!(row.wait, "in arrivo");

        let row = LineRow::from_state(&state(
            Some(DisplayValue::Text("boh".into())),
            Some(WaitStatus::UnknownText),
        ));
        assert_eq!(row.status, "unknown-text");

        let row = LineRow::from_state(&state(None, None));
        assert_eq!(row.wait, "unavailable");
        assert!(!row.available);
    }

    #[test]
    fn render_stop_page() {
        let template = StopTemplate {
            stop_id: "11471".to_string(),
            title: "Viale Monza Via Sauro".to_string(),
            scan_interval: 60,
            healthy: false,
            last_error: Some("request timed out".to_string()),
            last_success: "never".to_string(),
            lines: vec![LineRow::from_state(&state(
                Some(DisplayValue::Minutes(4)),
                Some(WaitStatus::Minutes),
            ))],
        };

        let html = template.render().unwrap();
        assert!(html.contains("Viale Monza Via Sauro"));
        assert!(html.contains("4 min"));
        assert!(html.contains("request timed out"));
    }

    #[test]
    fn render_empty_index() {
        let html = IndexTemplate { stops: Vec::new() }.render().unwrap();
        assert!(html.contains("No stops configured"));
    }
}

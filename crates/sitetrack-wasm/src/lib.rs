//! WebAssembly bindings for the sitetrack progress dashboard
//!
//! This crate provides a JavaScript-callable [`Dashboard`] that holds the
//! project configuration and progress log fetched by the page, and renders
//! the matrix, the progress chart and the summary from them. Views are
//! memoized, so re-rendering after an unrelated UI change is cheap.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use sitetrack_aggregate::Aggregator;
use sitetrack_core::{
    validate_entry, CellBucket, ProgressEntry, ProgressRecord, ProjectConfig, Renderer,
};
use sitetrack_render::{ChartSvgRenderer, ExcelRenderer, MatrixSvgRenderer};

/// Initialize panic hook for better error messages in console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Bucket name of a percentage ("no data", "none", "low", "mid", "high", "complete").
/// Negative values mean "no report".
#[wasm_bindgen]
pub fn bucket_name(percent: i32) -> String {
    bucket(percent).as_str().to_string()
}

/// Fill color of a percentage's bucket
#[wasm_bindgen]
pub fn bucket_fill(percent: i32) -> String {
    bucket(percent).fill().to_string()
}

fn bucket(percent: i32) -> CellBucket {
    CellBucket::for_value(u8::try_from(percent).ok())
}

#[derive(Serialize, Deserialize)]
struct EntryCheck {
    valid: bool,
    error: Option<String>,
}

// ============================================================================
// Dashboard Class
// ============================================================================

/// Project state of one page
#[wasm_bindgen]
pub struct Dashboard {
    config: ProjectConfig,
    records: Vec<ProgressRecord>,
    aggregator: Aggregator,
    show_planned: bool,
    last_error: Option<String>,
}

#[wasm_bindgen]
impl Dashboard {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            config: ProjectConfig::default(),
            records: Vec::new(),
            aggregator: Aggregator::new(),
            show_planned: false,
            last_error: None,
        }
    }

    /// Replace the configuration from its JSON form. Returns false on error.
    pub fn set_config(&mut self, json: &str) -> bool {
        match serde_json::from_str::<ProjectConfig>(json) {
            Ok(config) => {
                self.config = config;
                self.last_error = None;
                true
            }
            Err(e) => self.fail(format!("Invalid configuration: {e}")),
        }
    }

    /// Replace the configuration from a JS object
    pub fn set_config_value(&mut self, value: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<ProjectConfig>(value) {
            Ok(config) => {
                self.config = config;
                self.last_error = None;
                true
            }
            Err(e) => self.fail(format!("Invalid configuration: {e}")),
        }
    }

    /// Replace the progress log from its JSON form. Returns false on error.
    pub fn set_records(&mut self, json: &str) -> bool {
        match serde_json::from_str::<Vec<ProgressRecord>>(json) {
            Ok(records) => {
                self.records = records;
                self.last_error = None;
                true
            }
            Err(e) => self.fail(format!("Invalid progress records: {e}")),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn set_show_planned(&mut self, enabled: bool) {
        self.show_planned = enabled;
    }

    pub fn get_last_error(&self) -> Option<String> {
        self.last_error.clone()
    }

    /// Matrix of a tower as JSON. `activities` is a JSON array of names;
    /// empty means every activity.
    pub fn matrix_json(&mut self, tower: &str, activities: &str) -> String {
        let activities = match self.selected(activities) {
            Ok(a) => a,
            Err(e) => {
                self.fail(e);
                return String::new();
            }
        };
        let matrix = self.aggregator.matrix(&self.records, &self.config, tower, &activities);
        self.to_json(&*matrix)
    }

    /// Matrix of a tower as SVG, or an empty string
    pub fn render_matrix_svg(&mut self, tower: &str, activities: &str) -> String {
        let activities = match self.selected(activities) {
            Ok(a) => a,
            Err(e) => {
                self.fail(e);
                return String::new();
            }
        };
        let matrix = self.aggregator.matrix(&self.records, &self.config, tower, &activities);

        let mut renderer = MatrixSvgRenderer::new();
        if self.show_planned {
            renderer = renderer.with_planned();
        }
        match renderer.render(&self.config, &*matrix) {
            Ok(svg) => svg,
            Err(e) => {
                self.fail(e.to_string());
                String::new()
            }
        }
    }

    /// Real vs scheduled series as JSON. `now_ms` is `Date.now()`.
    pub fn series_json(&mut self, tower: &str, activity: &str, now_ms: f64) -> String {
        let now = timestamp(now_ms);
        let series = self.aggregator.series(&self.records, &self.config, tower, activity, now);
        self.to_json(&*series)
    }

    /// Real vs scheduled chart as SVG
    pub fn render_chart_svg(&mut self, tower: &str, activity: &str, now_ms: f64) -> String {
        let now = timestamp(now_ms);
        let series = self.aggregator.series(&self.records, &self.config, tower, activity, now);
        match ChartSvgRenderer::new().render(&self.config, &*series) {
            Ok(svg) => svg,
            Err(e) => {
                self.fail(e.to_string());
                String::new()
            }
        }
    }

    /// Project summary as JSON
    pub fn summary_json(&mut self) -> String {
        let summary = self.aggregator.summary(&self.records, &self.config);
        self.to_json(&*summary)
    }

    /// Excel workbook of a tower, empty on error
    pub fn render_xlsx(&mut self, tower: &str) -> Vec<u8> {
        let activities = self.config.activities.clone();
        let matrix = self.aggregator.matrix(&self.records, &self.config, tower, &activities);
        match ExcelRenderer::new().render(&self.config, &*matrix) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.fail(e.to_string());
                Vec::new()
            }
        }
    }

    /// Check a progress entry (JSON) against the configuration.
    /// Returns `{"valid": bool, "error": string|null}`.
    pub fn check_entry(&self, json: &str) -> String {
        let check = match serde_json::from_str::<ProgressEntry>(json) {
            Ok(entry) => match validate_entry(entry, &self.config) {
                Ok(_) => EntryCheck {
                    valid: true,
                    error: None,
                },
                Err(e) => EntryCheck {
                    valid: false,
                    error: Some(e.to_string()),
                },
            },
            Err(e) => EntryCheck {
                valid: false,
                error: Some(format!("Invalid entry: {e}")),
            },
        };
        serde_json::to_string(&check).unwrap_or_default()
    }
}

impl Dashboard {
    fn fail(&mut self, message: String) -> bool {
        self.last_error = Some(message);
        false
    }

    fn to_json<T: Serialize>(&mut self, value: &T) -> String {
        match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                self.fail(e.to_string());
                String::new()
            }
        }
    }

    fn selected(&self, activities: &str) -> Result<Vec<String>, String> {
        let requested: Vec<String> = if activities.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(activities).map_err(|e| format!("Invalid activity list: {e}"))?
        };
        if requested.is_empty() {
            return Ok(self.config.activities.clone());
        }
        Ok(self
            .config
            .activities
            .iter()
            .filter(|a| requested.contains(a))
            .cloned()
            .collect())
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

fn timestamp(ms: f64) -> sitetrack_core::Timestamp {
    chrono::DateTime::from_timestamp_millis(ms as i64)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "name": "Obra",
        "towers": ["A"],
        "floors": {"A": 2},
        "activities": ["Paint", "Tiles"],
        "scheduled_progress": {"A": {"Paint": {"1": 100, "2": 50}}},
        "scheduled_timeline": {"A": {"Paint": [{"date": "2025-03-01", "progress": 40}]}}
    }"#;

    const RECORDS: &str = r#"[
        {"timestamp": "2025-02-01 08:00:00", "user": "ana", "tower": "A", "floor": 1,
         "activity": "Paint", "percent": 80, "note": null},
        {"timestamp": "2025-02-10 08:00:00", "user": "ana", "tower": "A", "floor": 1,
         "activity": "Paint", "percent": 60, "note": "rework"}
    ]"#;

    // 2025-06-01T00:00:00Z
    const NOW_MS: f64 = 1_748_736_000_000.0;

    fn dashboard() -> Dashboard {
        let mut dashboard = Dashboard::new();
        assert!(dashboard.set_config(CONFIG));
        assert!(dashboard.set_records(RECORDS));
        dashboard
    }

    #[test]
    fn buckets() {
        assert_eq!(bucket_name(-1), "no data");
        assert_eq!(bucket_name(0), "none");
        assert_eq!(bucket_name(50), "mid");
        assert_eq!(bucket_name(100), "complete");
        assert_eq!(bucket_name(101), "no data");
        assert_eq!(bucket_fill(100), "#16a34a");
    }

    #[test]
    fn matrix_uses_latest_record() {
        let mut dashboard = dashboard();
        let json = dashboard.matrix_json("A", "");
        let matrix: serde_json::Value = serde_json::from_str(&json).unwrap();

        let total = matrix["totals"]
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["activity"] == "Paint")
            .unwrap();
        // (60 + 0) / 2
        assert_eq!(total["real"], 30);
        assert_eq!(total["planned"], 75);
    }

    #[test]
    fn matrix_activity_selection() {
        let mut dashboard = dashboard();
        let json = dashboard.matrix_json("A", r#"["Tiles"]"#);
        let matrix: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(matrix["activities"], serde_json::json!(["Tiles"]));

        assert_eq!(dashboard.matrix_json("A", "not json"), "");
        assert!(dashboard.get_last_error().unwrap().contains("Invalid activity list"));
    }

    #[test]
    fn series_never_drops() {
        let mut dashboard = dashboard();
        let json = dashboard.series_json("A", "Paint", NOW_MS);
        let series: serde_json::Value = serde_json::from_str(&json).unwrap();
        let values: Vec<u64> = series["real"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["value"].as_u64().unwrap())
            .collect();
        assert_eq!(values, vec![40, 40]);
    }

    #[test]
    fn svg_views() {
        let mut dashboard = dashboard();
        dashboard.set_show_planned(true);
        assert!(dashboard.render_matrix_svg("A", "").starts_with("<svg"));
        assert!(dashboard.render_chart_svg("A", "Paint", NOW_MS).starts_with("<svg"));
    }

    #[test]
    fn xlsx_bytes() {
        let mut dashboard = dashboard();
        let bytes = dashboard.render_xlsx("A");
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn summary_counts_records() {
        let mut dashboard = dashboard();
        let summary: serde_json::Value = serde_json::from_str(&dashboard.summary_json()).unwrap();
        assert_eq!(summary["records"], 2);
        assert_eq!(summary["reported_cells"], 1);
    }

    #[test]
    fn entry_checks() {
        let dashboard = dashboard();
        let ok = dashboard.check_entry(
            r#"{"user": "ana", "tower": "A", "floor": 2, "activity": "Tiles", "percent": 10}"#,
        );
        assert_eq!(ok, r#"{"valid":true,"error":null}"#);

        let bad = dashboard.check_entry(
            r#"{"user": "ana", "tower": "A", "floor": 9, "activity": "Tiles", "percent": 10}"#,
        );
        assert!(bad.contains(r#""valid":false"#));
        assert!(bad.contains("Floor 9"));
    }

    #[test]
    fn bad_config_is_reported() {
        let mut dashboard = Dashboard::new();
        assert!(!dashboard.set_config("{"));
        assert!(dashboard.get_last_error().unwrap().starts_with("Invalid configuration"));
        assert!(!dashboard.is_configured());
    }
}

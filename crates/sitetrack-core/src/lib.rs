//! # sitetrack-core
//!
//! Core domain model and traits for the sitetrack progress tracker.
//!
//! This crate provides:
//! - Domain types: `ProjectConfig`, `ProgressRecord`, `ProgressEntry`
//! - Derived view types: `TowerMatrix`, `TimeSeries`, `ProjectSummary`
//! - Color buckets for progress cells
//! - Draft editors with validation (`ConfigDraft`, `ProgressBatch`)
//! - The `Renderer` trait and error types
//!
//! ## Example
//!
//! ```rust
//! use sitetrack_core::{ProjectConfig, ProgressRecord};
//!
//! let config = ProjectConfig::new("Residencial Norte")
//!     .tower("A", 3)
//!     .activity("Paint")
//!     .plan("A", "Paint", 1, 100);
//!
//! let record = ProgressRecord::new("A", 1, "Paint", 80)
//!     .at("2025-03-04T10:00:00Z")
//!     .by("maria");
//!
//! assert_eq!(config.floor_count("A"), 3);
//! assert_eq!(record.key().to_string(), "A|1|Paint");
//! ```

pub mod bucket;
pub mod draft;
pub mod summary;
pub mod timestamp;

pub use bucket::CellBucket;
pub use draft::{validate_config, validate_entry, ConfigDraft, ProgressBatch, ValidationError};
pub use summary::{ProjectSummary, TowerSummary};
pub use timestamp::{parse_timestamp, Timestamp};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Name of a tower (unique within a project)
pub type TowerId = String;

/// Name of an activity (unique within a project)
pub type ActivityId = String;

/// Planned percentages by floor number
pub type FloorPlan = BTreeMap<u32, u8>;

// ============================================================================
// Project Configuration
// ============================================================================

/// A planned checkpoint on the scheduled timeline of a (tower, activity)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Date as delivered by the gateway (parsed lazily)
    pub date: String,
    /// Planned percentage at that date
    pub progress: u8,
}

impl Checkpoint {
    pub fn new(date: impl Into<String>, progress: u8) -> Self {
        Self {
            date: date.into(),
            progress,
        }
    }

    /// Parsed checkpoint date, `None` when unrecognized
    pub fn parsed_date(&self) -> Option<Timestamp> {
        parse_timestamp(&self.date)
    }
}

/// Project structure: towers, floors, activities and the planned baseline
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (empty means the project is not configured yet)
    pub name: String,
    /// Tower names in display order
    pub towers: Vec<TowerId>,
    /// Floor count per tower
    pub floors: BTreeMap<TowerId, u32>,
    /// Activity names in display order
    pub activities: Vec<ActivityId>,
    /// Planned percentage per tower, activity and floor
    pub scheduled_progress: BTreeMap<TowerId, BTreeMap<ActivityId, FloorPlan>>,
    /// Planned checkpoints per tower and activity
    pub scheduled_timeline: BTreeMap<TowerId, BTreeMap<ActivityId, Vec<Checkpoint>>>,
}

impl ProjectConfig {
    /// Create an empty configuration with the given project name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a tower with its floor count
    pub fn tower(mut self, name: impl Into<String>, floors: u32) -> Self {
        let name = name.into();
        if !self.towers.contains(&name) {
            self.towers.push(name.clone());
        }
        self.floors.insert(name, floors);
        self
    }

    /// Add an activity
    pub fn activity(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.activities.contains(&name) {
            self.activities.push(name);
        }
        self
    }

    /// Set the planned percentage of a single cell
    pub fn plan(mut self, tower: &str, activity: &str, floor: u32, percent: u8) -> Self {
        self.scheduled_progress
            .entry(tower.to_string())
            .or_default()
            .entry(activity.to_string())
            .or_default()
            .insert(floor, percent);
        self
    }

    /// Append a checkpoint to the scheduled timeline
    pub fn checkpoint(mut self, tower: &str, activity: &str, date: &str, percent: u8) -> Self {
        self.scheduled_timeline
            .entry(tower.to_string())
            .or_default()
            .entry(activity.to_string())
            .or_default()
            .push(Checkpoint::new(date, percent));
        self
    }

    /// Whether a project has been set up (non-empty name)
    pub fn is_configured(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn has_tower(&self, tower: &str) -> bool {
        self.towers.iter().any(|t| t == tower)
    }

    pub fn has_activity(&self, activity: &str) -> bool {
        self.activities.iter().any(|a| a == activity)
    }

    /// Floor count of a tower.
    ///
    /// Towers without an explicit count have a single floor.
    pub fn floor_count(&self, tower: &str) -> u32 {
        self.floors.get(tower).copied().unwrap_or(1)
    }

    /// Floor numbers of a tower, highest first (display order)
    pub fn floors_descending(&self, tower: &str) -> Vec<u32> {
        (1..=self.floor_count(tower)).rev().collect()
    }

    /// Planned percentage of a cell, if the baseline has one
    pub fn planned(&self, tower: &str, activity: &str, floor: u32) -> Option<u8> {
        self.scheduled_progress
            .get(tower)
            .and_then(|a| a.get(activity))
            .and_then(|f| f.get(&floor))
            .copied()
    }

    /// Scheduled timeline of a (tower, activity); empty when none was planned
    pub fn timeline(&self, tower: &str, activity: &str) -> &[Checkpoint] {
        self.scheduled_timeline
            .get(tower)
            .and_then(|a| a.get(activity))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of floors across all towers
    pub fn total_floors(&self) -> u32 {
        self.towers.iter().map(|t| self.floor_count(t)).sum()
    }
}

// ============================================================================
// Progress Records
// ============================================================================

/// Identity of a matrix cell
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub tower: TowerId,
    pub floor: u32,
    pub activity: ActivityId,
}

impl CellKey {
    pub fn new(tower: impl Into<String>, floor: u32, activity: impl Into<String>) -> Self {
        Self {
            tower: tower.into(),
            floor,
            activity: activity.into(),
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.tower, self.floor, self.activity)
    }
}

/// A saved progress fact. The gateway is the system of record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// Timestamp text as stored by the gateway; also the display date
    pub timestamp: String,
    /// Who reported the progress
    pub user: String,
    pub tower: TowerId,
    pub floor: u32,
    pub activity: ActivityId,
    /// Percentage complete, 0-100
    pub percent: u8,
    /// Free-form remark
    pub note: Option<String>,
}

impl ProgressRecord {
    pub fn new(tower: impl Into<String>, floor: u32, activity: impl Into<String>, percent: u8) -> Self {
        Self {
            timestamp: String::new(),
            user: String::new(),
            tower: tower.into(),
            floor,
            activity: activity.into(),
            percent,
            note: None,
        }
    }

    /// Set the timestamp
    pub fn at(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Set the reporting user
    pub fn by(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Attach a note
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn key(&self) -> CellKey {
        CellKey::new(self.tower.clone(), self.floor, self.activity.clone())
    }

    /// Parsed timestamp, `None` when the text is not a recognized date
    pub fn parsed_timestamp(&self) -> Option<Timestamp> {
        parse_timestamp(&self.timestamp)
    }

    /// Date shown to users ("Fecha"), identical to the timestamp
    pub fn display_date(&self) -> &str {
        &self.timestamp
    }
}

/// A progress report that has not been saved yet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub user: String,
    pub tower: TowerId,
    pub floor: u32,
    pub activity: ActivityId,
    pub percent: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ProgressEntry {
    pub fn new(
        user: impl Into<String>,
        tower: impl Into<String>,
        floor: u32,
        activity: impl Into<String>,
        percent: u8,
    ) -> Self {
        Self {
            user: user.into(),
            tower: tower.into(),
            floor,
            activity: activity.into(),
            percent,
            note: None,
        }
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

// ============================================================================
// Derived Views
// ============================================================================

/// One cell of the progress matrix
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub activity: ActivityId,
    /// Latest reported percentage
    pub real: Option<u8>,
    /// Planned percentage from the baseline
    pub planned: Option<u8>,
    /// Record behind `real`, for tooltips and exports
    pub record: Option<ProgressRecord>,
}

impl MatrixCell {
    pub fn real_bucket(&self) -> CellBucket {
        CellBucket::for_value(self.real)
    }

    pub fn planned_bucket(&self) -> CellBucket {
        CellBucket::for_value(self.planned)
    }
}

/// A floor row of the matrix
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatrixRow {
    pub floor: u32,
    pub cells: Vec<MatrixCell>,
}

/// Real and planned averages of an activity across a tower
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTotal {
    pub activity: ActivityId,
    pub real: u8,
    pub planned: u8,
}

/// Floors × activities grid for a single tower
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerMatrix {
    pub tower: TowerId,
    pub activities: Vec<ActivityId>,
    /// Rows ordered from the top floor down
    pub rows: Vec<MatrixRow>,
    pub totals: Vec<ActivityTotal>,
}

impl TowerMatrix {
    pub fn cell(&self, floor: u32, activity: &str) -> Option<&MatrixCell> {
        self.rows
            .iter()
            .find(|r| r.floor == floor)
            .and_then(|r| r.cells.iter().find(|c| c.activity == activity))
    }

    pub fn total(&self, activity: &str) -> Option<&ActivityTotal> {
        self.totals.iter().find(|t| t.activity == activity)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.activities.is_empty()
    }
}

/// A point on a progress chart
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub at: NaiveDateTime,
    pub value: u8,
}

/// Visible time window of a chart
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// Real vs scheduled progress over time for a (tower, activity)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub tower: TowerId,
    pub activity: ActivityId,
    /// Running tower average after each report, non-decreasing
    pub real: Vec<SeriesPoint>,
    /// Planned checkpoints, non-decreasing
    pub scheduled: Vec<SeriesPoint>,
    pub range: DateRange,
}

impl TimeSeries {
    pub fn is_empty(&self) -> bool {
        self.real.is_empty() && self.scheduled.is_empty()
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering of a derived view
pub trait Renderer<V: ?Sized> {
    type Output;

    /// Render a view of the configured project
    fn render(&self, config: &ProjectConfig, view: &V) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = ProjectConfig::new("Obra")
            .tower("A", 3)
            .tower("B", 5)
            .activity("Paint")
            .activity("Tiles");

        assert!(config.is_configured());
        assert_eq!(config.towers, vec!["A", "B"]);
        assert_eq!(config.floor_count("B"), 5);
        assert_eq!(config.total_floors(), 8);
        assert!(config.has_activity("Tiles"));
    }

    #[test]
    fn duplicate_tower_updates_floors() {
        let config = ProjectConfig::new("Obra").tower("A", 3).tower("A", 7);
        assert_eq!(config.towers.len(), 1);
        assert_eq!(config.floor_count("A"), 7);
    }

    #[test]
    fn unknown_tower_defaults_to_one_floor() {
        let config = ProjectConfig::new("Obra");
        assert_eq!(config.floor_count("Z"), 1);
    }

    #[test]
    fn floors_descending_order() {
        let config = ProjectConfig::new("Obra").tower("A", 3);
        assert_eq!(config.floors_descending("A"), vec![3, 2, 1]);
    }

    #[test]
    fn planned_and_timeline_lookup() {
        let config = ProjectConfig::new("Obra")
            .tower("A", 2)
            .activity("Paint")
            .plan("A", "Paint", 2, 40)
            .checkpoint("A", "Paint", "01/02/2025", 10);

        assert_eq!(config.planned("A", "Paint", 2), Some(40));
        assert_eq!(config.planned("A", "Paint", 1), None);
        assert_eq!(config.timeline("A", "Paint").len(), 1);
        assert!(config.timeline("B", "Paint").is_empty());
    }

    #[test]
    fn unconfigured_when_name_blank() {
        assert!(!ProjectConfig::new("  ").is_configured());
    }

    #[test]
    fn cell_key_display() {
        let key = CellKey::new("Torre 1", 12, "Pintura");
        assert_eq!(key.to_string(), "Torre 1|12|Pintura");
    }

    #[test]
    fn record_builder_and_display_date() {
        let record = ProgressRecord::new("A", 2, "Paint", 55)
            .at("05/03/2025 14:22:01")
            .by("luis")
            .note("second coat");

        assert_eq!(record.display_date(), "05/03/2025 14:22:01");
        assert_eq!(record.user, "luis");
        assert_eq!(record.note.as_deref(), Some("second coat"));
        assert!(record.parsed_timestamp().is_some());
    }

    #[test]
    fn matrix_cell_buckets() {
        let cell = MatrixCell {
            activity: "Paint".into(),
            real: Some(50),
            planned: None,
            record: None,
        };
        assert_eq!(cell.real_bucket(), CellBucket::Mid);
        assert_eq!(cell.planned_bucket(), CellBucket::NoData);
    }
}

//! # sitetrack-aggregate
//!
//! Turns raw progress records plus a project configuration into the views
//! the matrix and the analysis chart are drawn from.
//!
//! This crate provides:
//! - Latest record per (tower, floor, activity)
//! - Real and planned activity averages per tower
//! - Real vs scheduled time series with a chart window, and the gap
//!   between them at each checkpoint
//! - A whole-project summary
//! - `Aggregator`, which memoizes the above on its inputs
//!
//! All functions are pure and synchronous.
//!
//! ## Example
//!
//! ```rust
//! use sitetrack_aggregate::{activity_totals, latest_cell_map};
//! use sitetrack_core::ProgressRecord;
//!
//! let records = vec![
//!     ProgressRecord::new("A", 1, "Paint", 100).at("2025-03-01"),
//!     ProgressRecord::new("A", 2, "Paint", 50).at("2025-03-02"),
//!     ProgressRecord::new("A", 3, "Paint", 0).at("2025-03-03"),
//! ];
//! let cells = latest_cell_map(&records);
//! let totals = activity_totals(&cells, "A", &["Paint".to_string()], 3);
//! assert_eq!(totals["Paint"], 50);
//! ```

pub mod cells;
pub mod series;
pub mod summary;
pub mod totals;

pub use cells::{chronological, latest_cell_map, latest_percent, CellMap};
pub use series::{
    chart_range, clamp_monotonic, real_series, scheduled_series, time_series, variances, Variance,
};
pub use summary::{project_summary, summarize};
pub use totals::{activity_totals, mean_percent, scheduled_totals, tower_matrix};

use std::sync::Arc;

use sitetrack_core::{
    ActivityId, ProgressRecord, ProjectConfig, ProjectSummary, TimeSeries, Timestamp, TowerMatrix,
};

// ============================================================================
// Memoization
// ============================================================================

/// Single-slot cache: keeps the last key and value
#[derive(Debug)]
struct Memo<K, V> {
    slot: Option<(K, Arc<V>)>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<K, V> Memo<K, V> {
    /// Return the cached value when `is_same` accepts the stored key,
    /// otherwise compute, store and return a fresh one.
    fn get_or_compute(
        &mut self,
        stats: &mut MemoStats,
        is_same: impl Fn(&K) -> bool,
        make_key: impl FnOnce() -> K,
        compute: impl FnOnce() -> V,
    ) -> Arc<V> {
        if let Some((key, value)) = &self.slot {
            if is_same(key) {
                stats.hits += 1;
                return Arc::clone(value);
            }
        }
        stats.misses += 1;
        let value = Arc::new(compute());
        self.slot = Some((make_key(), Arc::clone(&value)));
        value
    }
}

/// Cache hit/miss counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
struct CellsKey {
    records: Vec<ProgressRecord>,
}

#[derive(Debug)]
struct MatrixKey {
    records: Vec<ProgressRecord>,
    config: ProjectConfig,
    tower: String,
    activities: Vec<ActivityId>,
}

#[derive(Debug)]
struct SeriesKey {
    records: Vec<ProgressRecord>,
    config: ProjectConfig,
    tower: String,
    activity: String,
}

#[derive(Debug)]
struct SummaryKey {
    records: Vec<ProgressRecord>,
    config: ProjectConfig,
}

/// Memoized aggregation.
///
/// Each view is recomputed only when its inputs (records, configuration and
/// selection) differ from the previous call. Inputs are compared by value,
/// so callers may rebuild their collections freely.
#[derive(Debug, Default)]
pub struct Aggregator {
    cells: Memo<CellsKey, CellMap>,
    matrix: Memo<MatrixKey, TowerMatrix>,
    series: Memo<SeriesKey, TimeSeries>,
    summary: Memo<SummaryKey, ProjectSummary>,
    stats: MemoStats,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest record per cell
    pub fn cells(&mut self, records: &[ProgressRecord]) -> Arc<CellMap> {
        self.cells.get_or_compute(
            &mut self.stats,
            |k| k.records == records,
            || CellsKey {
                records: records.to_vec(),
            },
            || latest_cell_map(records),
        )
    }

    /// Matrix of a tower restricted to `activities`
    pub fn matrix(
        &mut self,
        records: &[ProgressRecord],
        config: &ProjectConfig,
        tower: &str,
        activities: &[ActivityId],
    ) -> Arc<TowerMatrix> {
        let cells = self.cells(records);
        self.matrix.get_or_compute(
            &mut self.stats,
            |k| {
                k.tower == tower
                    && k.activities == activities
                    && k.config == *config
                    && k.records == records
            },
            || MatrixKey {
                records: records.to_vec(),
                config: config.clone(),
                tower: tower.to_string(),
                activities: activities.to_vec(),
            },
            || tower_matrix(config, &cells, tower, activities),
        )
    }

    /// Time series of a (tower, activity).
    ///
    /// `now` only matters when the series has no dated points; a cached empty
    /// series gets its window moved to the new `now`.
    pub fn series(
        &mut self,
        records: &[ProgressRecord],
        config: &ProjectConfig,
        tower: &str,
        activity: &str,
        now: Timestamp,
    ) -> Arc<TimeSeries> {
        let series = self.series.get_or_compute(
            &mut self.stats,
            |k| {
                k.tower == tower
                    && k.activity == activity
                    && k.config == *config
                    && k.records == records
            },
            || SeriesKey {
                records: records.to_vec(),
                config: config.clone(),
                tower: tower.to_string(),
                activity: activity.to_string(),
            },
            || {
                time_series(
                    records,
                    config.timeline(tower, activity),
                    tower,
                    activity,
                    config.floor_count(tower),
                    now,
                )
            },
        );

        if series.is_empty() && series.range.start != now {
            let mut moved = (*series).clone();
            moved.range = chart_range(std::iter::empty(), now);
            return Arc::new(moved);
        }
        series
    }

    /// Whole-project summary
    pub fn summary(&mut self, records: &[ProgressRecord], config: &ProjectConfig) -> Arc<ProjectSummary> {
        let cells = self.cells(records);
        self.summary.get_or_compute(
            &mut self.stats,
            |k| k.config == *config && k.records == records,
            || SummaryKey {
                records: records.to_vec(),
                config: config.clone(),
            },
            || summarize(config, &cells, records.len()),
        )
    }

    pub fn stats(&self) -> MemoStats {
        self.stats
    }
}

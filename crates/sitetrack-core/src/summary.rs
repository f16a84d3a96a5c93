//! Project summary
//!
//! Answers "how far along is the whole project?" from the latest state of
//! every cell. The aggregator fills it in; renderers and the CLI print it.

use serde::{Deserialize, Serialize};

/// Per-tower line of the summary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerSummary {
    pub tower: String,
    pub floors: u32,
    /// Mean of the real activity totals
    pub progress: u8,
    /// Mean of the planned activity totals
    pub planned: u8,
}

/// Aggregated project figures
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_name: String,
    pub towers: Vec<TowerSummary>,
    pub activities: usize,
    pub total_floors: u32,
    /// towers × floors × activities
    pub total_cells: usize,
    /// Cells with at least one report
    pub reported_cells: usize,
    /// Cells whose latest report is 100%
    pub completed_cells: usize,
    /// Mean of the tower progress values
    pub overall_progress: u8,
    /// Number of progress records considered
    pub records: usize,
}

impl ProjectSummary {
    /// Share of cells that have been reported at least once, 0-100
    pub fn coverage(&self) -> u8 {
        if self.total_cells == 0 {
            return 0;
        }
        (self.reported_cells as f64 * 100.0 / self.total_cells as f64).round() as u8
    }

    /// Gap between planned and real progress across towers (positive = behind)
    pub fn lag(&self) -> i16 {
        if self.towers.is_empty() {
            return 0;
        }
        let planned: f64 = self.towers.iter().map(|t| t.planned as f64).sum::<f64>()
            / self.towers.len() as f64;
        planned.round() as i16 - self.overall_progress as i16
    }
}

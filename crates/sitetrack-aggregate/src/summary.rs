//! Whole-project figures

use sitetrack_core::{CellKey, ProgressRecord, ProjectConfig, ProjectSummary, TowerSummary};

use crate::cells::{latest_cell_map, CellMap};
use crate::totals::{activity_totals, mean_percent, scheduled_totals};

/// Summarize a project from its records
pub fn project_summary(config: &ProjectConfig, records: &[ProgressRecord]) -> ProjectSummary {
    summarize(config, &latest_cell_map(records), records.len())
}

/// Summarize from an already folded cell map
pub fn summarize(config: &ProjectConfig, cells: &CellMap, records: usize) -> ProjectSummary {
    let mut reported_cells = 0;
    let mut completed_cells = 0;
    let mut towers = Vec::with_capacity(config.towers.len());

    for tower in &config.towers {
        let floors = config.floor_count(tower);

        for floor in 1..=floors {
            for activity in &config.activities {
                if let Some(record) = cells.get(&CellKey::new(tower.as_str(), floor, activity.as_str())) {
                    reported_cells += 1;
                    if record.percent == 100 {
                        completed_cells += 1;
                    }
                }
            }
        }

        let real = activity_totals(cells, tower, &config.activities, floors);
        let planned = scheduled_totals(config, tower, &config.activities);
        let activity_count = config.activities.len() as u32;

        towers.push(TowerSummary {
            tower: tower.clone(),
            floors,
            progress: mean_percent(real.values().copied().map(u64::from).sum(), activity_count),
            planned: mean_percent(planned.values().copied().map(u64::from).sum(), activity_count),
        });
    }

    let overall_progress = mean_percent(
        towers.iter().map(|t| u64::from(t.progress)).sum(),
        towers.len() as u32,
    );
    let total_floors = config.total_floors();

    ProjectSummary {
        project_name: config.name.clone(),
        towers,
        activities: config.activities.len(),
        total_floors,
        total_cells: total_floors as usize * config.activities.len(),
        reported_cells,
        completed_cells,
        overall_progress,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn summary_counts_cells() {
        let config = ProjectConfig::new("Obra")
            .tower("A", 2)
            .tower("B", 1)
            .activity("Paint")
            .activity("Tiles")
            .plan("B", "Paint", 1, 100);
        let records = vec![
            ProgressRecord::new("A", 1, "Paint", 100).at("2025-01-01"),
            ProgressRecord::new("A", 2, "Paint", 50).at("2025-01-02"),
            ProgressRecord::new("A", 2, "Paint", 60).at("2025-01-03"),
            ProgressRecord::new("B", 1, "Tiles", 100).at("2025-01-03"),
        ];

        let summary = project_summary(&config, &records);

        assert_eq!(summary.total_floors, 3);
        assert_eq!(summary.total_cells, 6);
        assert_eq!(summary.reported_cells, 3);
        assert_eq!(summary.completed_cells, 2);
        assert_eq!(summary.records, 4);
        // A: Paint (100+60)/2 = 80, Tiles 0 -> 40; B: Paint 0, Tiles 100 -> 50
        assert_eq!(summary.towers[0].progress, 40);
        assert_eq!(summary.towers[1].progress, 50);
        assert_eq!(summary.towers[1].planned, 50);
        assert_eq!(summary.overall_progress, 45);
    }

    #[test]
    fn empty_project() {
        let summary = project_summary(&ProjectConfig::default(), &[]);
        assert_eq!(summary.total_cells, 0);
        assert_eq!(summary.overall_progress, 0);
        assert!(summary.towers.is_empty());
    }
}

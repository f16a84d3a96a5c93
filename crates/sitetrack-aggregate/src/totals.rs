//! Tower averages and the progress matrix

use std::collections::BTreeMap;

use sitetrack_core::{
    ActivityId, ActivityTotal, CellKey, MatrixCell, MatrixRow, ProjectConfig, TowerMatrix,
};

use crate::cells::{latest_percent, CellMap};

/// Integer mean rounded half-up. A zero divisor yields 0.
pub fn mean_percent(sum: u64, count: u32) -> u8 {
    if count == 0 {
        return 0;
    }
    let count = u64::from(count);
    ((2 * sum + count) / (2 * count)).min(100) as u8
}

/// Average real progress of each activity across the floors of a tower.
///
/// Floors without a report count as 0. A tower with no floors reports 0 for
/// every activity.
pub fn activity_totals(
    cells: &CellMap,
    tower: &str,
    activities: &[ActivityId],
    floor_count: u32,
) -> BTreeMap<ActivityId, u8> {
    activities
        .iter()
        .map(|activity| {
            let sum: u64 = (1..=floor_count)
                .filter_map(|floor| latest_percent(cells, tower, floor, activity))
                .map(u64::from)
                .sum();
            (activity.clone(), mean_percent(sum, floor_count))
        })
        .collect()
}

/// Average planned progress of each activity across the floors of a tower.
///
/// Same arithmetic as [`activity_totals`], read from the scheduled-progress
/// table of the configuration.
pub fn scheduled_totals(
    config: &ProjectConfig,
    tower: &str,
    activities: &[ActivityId],
) -> BTreeMap<ActivityId, u8> {
    let floor_count = config.floor_count(tower);
    activities
        .iter()
        .map(|activity| {
            let sum: u64 = (1..=floor_count)
                .filter_map(|floor| config.planned(tower, activity, floor))
                .map(u64::from)
                .sum();
            (activity.clone(), mean_percent(sum, floor_count))
        })
        .collect()
}

/// Build the floors × activities grid of a tower.
///
/// Rows run from the top floor down; columns follow `activities`.
pub fn tower_matrix(
    config: &ProjectConfig,
    cells: &CellMap,
    tower: &str,
    activities: &[ActivityId],
) -> TowerMatrix {
    let floor_count = config.floor_count(tower);

    let rows = config
        .floors_descending(tower)
        .into_iter()
        .map(|floor| MatrixRow {
            floor,
            cells: activities
                .iter()
                .map(|activity| {
                    let record = cells
                        .get(&CellKey::new(tower, floor, activity.as_str()))
                        .cloned();
                    MatrixCell {
                        activity: activity.clone(),
                        real: record.as_ref().map(|r| r.percent),
                        planned: config.planned(tower, activity, floor),
                        record,
                    }
                })
                .collect(),
        })
        .collect();

    let real = activity_totals(cells, tower, activities, floor_count);
    let planned = scheduled_totals(config, tower, activities);
    let totals = activities
        .iter()
        .map(|activity| ActivityTotal {
            activity: activity.clone(),
            real: real.get(activity).copied().unwrap_or(0),
            planned: planned.get(activity).copied().unwrap_or(0),
        })
        .collect();

    TowerMatrix {
        tower: tower.to_string(),
        activities: activities.to_vec(),
        rows,
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::latest_cell_map;
    use pretty_assertions::assert_eq;
    use sitetrack_core::ProgressRecord;

    fn paint() -> Vec<ActivityId> {
        vec!["Paint".to_string()]
    }

    #[test]
    fn mean_rounds_half_up() {
        assert_eq!(mean_percent(150, 3), 50);
        assert_eq!(mean_percent(1, 2), 1);
        assert_eq!(mean_percent(101, 2), 51);
        assert_eq!(mean_percent(100, 3), 33);
        assert_eq!(mean_percent(200, 3), 67);
    }

    #[test]
    fn zero_floors_yield_zero() {
        let cells = latest_cell_map(&[ProgressRecord::new("A", 1, "Paint", 100)]);
        let totals = activity_totals(&cells, "A", &paint(), 0);
        assert_eq!(totals.get("Paint"), Some(&0));
    }

    #[test]
    fn all_floors_complete() {
        let records: Vec<_> = (1..=4)
            .map(|f| ProgressRecord::new("A", f, "Paint", 100).at("2025-01-01"))
            .collect();
        let totals = activity_totals(&latest_cell_map(&records), "A", &paint(), 4);
        assert_eq!(totals.get("Paint"), Some(&100));
    }

    #[test]
    fn floors_outside_tower_are_ignored() {
        let records = vec![ProgressRecord::new("A", 9, "Paint", 100).at("2025-01-01")];
        let totals = activity_totals(&latest_cell_map(&records), "A", &paint(), 2);
        assert_eq!(totals.get("Paint"), Some(&0));
    }

    #[test]
    fn scheduled_totals_from_baseline() {
        let config = ProjectConfig::new("Obra")
            .tower("A", 4)
            .activity("Paint")
            .plan("A", "Paint", 1, 100)
            .plan("A", "Paint", 2, 50);
        let totals = scheduled_totals(&config, "A", &config.activities);
        // (100 + 50 + 0 + 0) / 4 = 37.5
        assert_eq!(totals.get("Paint"), Some(&38));
    }

    #[test]
    fn matrix_layout() {
        let config = ProjectConfig::new("Obra")
            .tower("A", 2)
            .activity("Paint")
            .activity("Tiles")
            .plan("A", "Tiles", 2, 80);
        let cells = latest_cell_map(&[ProgressRecord::new("A", 1, "Paint", 40).at("2025-01-01")]);

        let matrix = tower_matrix(&config, &cells, "A", &config.activities);

        assert_eq!(matrix.rows.iter().map(|r| r.floor).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(matrix.cell(1, "Paint").and_then(|c| c.real), Some(40));
        assert_eq!(matrix.cell(2, "Paint").and_then(|c| c.real), None);
        assert_eq!(matrix.cell(2, "Tiles").and_then(|c| c.planned), Some(80));
        assert_eq!(matrix.total("Paint").map(|t| t.real), Some(20));
        assert_eq!(matrix.total("Tiles").map(|t| t.planned), Some(40));
    }

    #[test]
    fn matrix_respects_activity_filter() {
        let config = ProjectConfig::new("Obra")
            .tower("A", 1)
            .activity("Paint")
            .activity("Tiles");
        let matrix = tower_matrix(&config, &CellMap::new(), "A", &["Tiles".to_string()]);
        assert_eq!(matrix.activities, vec!["Tiles"]);
        assert_eq!(matrix.rows[0].cells.len(), 1);
    }
}

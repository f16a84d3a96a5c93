//! Latest state of every matrix cell

use std::collections::BTreeMap;

use sitetrack_core::{CellKey, ProgressRecord, Timestamp};

/// Latest record per (tower, floor, activity)
pub type CellMap = BTreeMap<CellKey, ProgressRecord>;

/// Sort records chronologically.
///
/// The sort is stable and unparseable timestamps order before every valid
/// one, so records with equal (or equally broken) timestamps keep their input
/// order.
pub fn chronological(records: &[ProgressRecord]) -> Vec<(Option<Timestamp>, &ProgressRecord)> {
    let mut sorted: Vec<_> = records
        .iter()
        .map(|r| (r.parsed_timestamp(), r))
        .collect();
    sorted.sort_by_key(|(ts, _)| *ts);
    sorted
}

/// Fold records into the latest record per cell.
///
/// For every key the surviving record is the one with the greatest
/// timestamp; on ties the one appearing last in `records` wins.
pub fn latest_cell_map(records: &[ProgressRecord]) -> CellMap {
    let mut cells = CellMap::new();
    for (_, record) in chronological(records) {
        cells.insert(record.key(), record.clone());
    }
    cells
}

/// Latest percentage of a single cell
pub fn latest_percent(cells: &CellMap, tower: &str, floor: u32, activity: &str) -> Option<u8> {
    cells
        .get(&CellKey::new(tower, floor, activity))
        .map(|r| r.percent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rec(floor: u32, percent: u8, ts: &str) -> ProgressRecord {
        ProgressRecord::new("A", floor, "Paint", percent).at(ts)
    }

    #[test]
    fn later_timestamp_wins_even_if_lower() {
        let records = vec![
            rec(1, 60, "2025-03-02T09:00:00Z"),
            rec(1, 80, "2025-03-01T09:00:00Z"),
        ];
        let cells = latest_cell_map(&records);
        assert_eq!(cells.len(), 1);
        assert_eq!(latest_percent(&cells, "A", 1, "Paint"), Some(60));
    }

    #[test]
    fn mixed_date_shapes_compare_chronologically() {
        let records = vec![
            rec(1, 90, "03/03/2025"),
            rec(1, 30, "2025-03-02T23:59:59Z"),
        ];
        assert_eq!(latest_percent(&latest_cell_map(&records), "A", 1, "Paint"), Some(90));
    }

    #[test]
    fn rfc2822_and_javascript_dates_order_by_instant() {
        let records = vec![
            rec(1, 80, "2025-03-01T09:00:00Z"),
            rec(1, 60, "Mon, 10 Mar 2025 09:00:00 GMT"),
        ];
        assert_eq!(latest_percent(&latest_cell_map(&records), "A", 1, "Paint"), Some(60));

        let records = vec![
            rec(2, 40, "Mon Mar 10 2025 09:00:00 GMT-0500 (Eastern Standard Time)"),
            rec(2, 90, "2025-03-10T13:00:00Z"),
        ];
        assert_eq!(latest_percent(&latest_cell_map(&records), "A", 2, "Paint"), Some(40));
    }

    #[test]
    fn ties_keep_input_order() {
        let records = vec![
            rec(2, 10, "2025-03-01T09:00:00Z"),
            rec(2, 20, "2025-03-01T09:00:00Z"),
        ];
        assert_eq!(latest_percent(&latest_cell_map(&records), "A", 2, "Paint"), Some(20));
    }

    #[test]
    fn unparseable_timestamp_sorts_first() {
        let records = vec![
            rec(3, 70, "2025-01-01T00:00:00Z"),
            rec(3, 99, "not a date"),
        ];
        assert_eq!(latest_percent(&latest_cell_map(&records), "A", 3, "Paint"), Some(70));
    }

    #[test]
    fn distinct_keys_are_independent() {
        let records = vec![
            rec(1, 10, "2025-01-01T00:00:00Z"),
            rec(2, 20, "2025-01-01T00:00:00Z"),
            ProgressRecord::new("B", 1, "Paint", 30).at("2025-01-01T00:00:00Z"),
        ];
        let cells = latest_cell_map(&records);
        assert_eq!(cells.len(), 3);
        assert_eq!(latest_percent(&cells, "B", 1, "Paint"), Some(30));
        assert_eq!(latest_percent(&cells, "B", 2, "Paint"), None);
    }

    #[test]
    fn empty_input() {
        assert!(latest_cell_map(&[]).is_empty());
    }
}

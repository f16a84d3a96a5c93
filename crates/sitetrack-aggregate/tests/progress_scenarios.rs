//! End-to-end aggregation scenarios

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sitetrack_aggregate::{
    activity_totals, latest_cell_map, latest_percent, time_series, Aggregator,
};
use sitetrack_core::{CellBucket, Checkpoint, ProgressRecord, ProjectConfig, Timestamp};

fn now() -> Timestamp {
    NaiveDate::from_ymd_opt(2025, 7, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn paint_tower() -> ProjectConfig {
    ProjectConfig::new("Residencial Norte")
        .tower("A", 3)
        .activity("Paint")
}

/// Every ordering of the input produces the same latest-cell map
#[test]
fn latest_cell_map_is_order_independent() {
    let records = vec![
        ProgressRecord::new("A", 1, "Paint", 20).at("2025-04-01T08:00:00Z"),
        ProgressRecord::new("A", 1, "Paint", 90).at("2025-04-03T08:00:00Z"),
        ProgressRecord::new("A", 1, "Paint", 45).at("2025-04-02T08:00:00Z"),
        ProgressRecord::new("A", 2, "Paint", 10).at("01/04/2025"),
    ];

    let expected = latest_cell_map(&records);
    assert_eq!(latest_percent(&expected, "A", 1, "Paint"), Some(90));

    let n = records.len();
    for rotation in 0..n {
        let mut shuffled = records.clone();
        shuffled.rotate_left(rotation);
        assert_eq!(latest_cell_map(&shuffled), expected, "rotation {}", rotation);

        shuffled.reverse();
        assert_eq!(latest_cell_map(&shuffled), expected, "reversed rotation {}", rotation);
    }
}

#[test]
fn three_floor_average() {
    let config = paint_tower();
    let records = vec![
        ProgressRecord::new("A", 1, "Paint", 100).at("2025-05-01T09:00:00Z"),
        ProgressRecord::new("A", 2, "Paint", 50).at("2025-05-02T09:00:00Z"),
        ProgressRecord::new("A", 3, "Paint", 0).at("2025-05-03T09:00:00Z"),
    ];

    let totals = activity_totals(&latest_cell_map(&records), "A", &config.activities, 3);
    assert_eq!(totals.get("Paint"), Some(&50));
}

#[test]
fn tower_without_records_is_zero() {
    let config = paint_tower().activity("Tiles");
    let totals = activity_totals(&latest_cell_map(&[]), "A", &config.activities, 3);
    assert_eq!(totals.get("Paint"), Some(&0));
    assert_eq!(totals.get("Tiles"), Some(&0));
}

/// A later, lower report wins in the matrix while the trend line holds the
/// earlier high.
#[test]
fn lower_report_diverges_from_trend() {
    let config = ProjectConfig::new("Obra").tower("A", 1).activity("Paint");
    let records = vec![
        ProgressRecord::new("A", 1, "Paint", 80).at("2025-05-01T09:00:00Z"),
        ProgressRecord::new("A", 1, "Paint", 60).at("2025-05-08T09:00:00Z"),
    ];

    let cells = latest_cell_map(&records);
    assert_eq!(latest_percent(&cells, "A", 1, "Paint"), Some(60));

    let series = time_series(&records, config.timeline("A", "Paint"), "A", "Paint", 1, now());
    let values: Vec<u8> = series.real.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![80, 80]);
}

#[test]
fn series_never_decrease() {
    let config = ProjectConfig::new("Obra")
        .tower("A", 4)
        .activity("Paint")
        .checkpoint("A", "Paint", "15/05/2025", 50)
        .checkpoint("A", "Paint", "01/05/2025", 20)
        .checkpoint("A", "Paint", "30/05/2025", 40)
        .checkpoint("A", "Paint", "15/06/2025", 100);

    let records = vec![
        ProgressRecord::new("A", 1, "Paint", 100).at("2025-05-02"),
        ProgressRecord::new("A", 2, "Paint", 100).at("2025-05-03"),
        ProgressRecord::new("A", 1, "Paint", 0).at("2025-05-04"),
        ProgressRecord::new("A", 2, "Paint", 30).at("2025-05-05"),
        ProgressRecord::new("A", 3, "Paint", 100).at("2025-05-06"),
        ProgressRecord::new("A", 4, "Paint", 100).at("2025-05-07"),
    ];

    let series = time_series(
        &records,
        config.timeline("A", "Paint"),
        "A",
        "Paint",
        config.floor_count("A"),
        now(),
    );

    for points in [&series.real, &series.scheduled] {
        for pair in points.windows(2) {
            assert!(pair[1].value >= pair[0].value, "{:?}", pair);
            assert!(pair[1].at >= pair[0].at);
        }
    }
    assert_eq!(series.scheduled.last().map(|p| p.value), Some(100));
    assert_eq!(series.real.len(), 6);
}

#[test]
fn memoized_matrix_colors() {
    let config = paint_tower().plan("A", "Paint", 3, 100);
    let records = vec![
        ProgressRecord::new("A", 1, "Paint", 100).at("2025-05-01"),
        ProgressRecord::new("A", 2, "Paint", 50).at("2025-05-01"),
    ];

    let mut agg = Aggregator::new();
    let matrix = agg.matrix(&records, &config, "A", &config.activities);

    let bucket = |floor| matrix.cell(floor, "Paint").map(|c| c.real_bucket());
    assert_eq!(bucket(1), Some(CellBucket::Complete));
    assert_eq!(bucket(2), Some(CellBucket::Mid));
    assert_eq!(bucket(3), Some(CellBucket::NoData));
    assert_eq!(
        matrix.cell(3, "Paint").map(|c| c.planned_bucket()),
        Some(CellBucket::Complete)
    );
}

#[test]
fn undated_checkpoints_do_not_widen_range() {
    let timeline = vec![
        Checkpoint::new("10/05/2025", 10),
        Checkpoint::new("someday", 90),
    ];
    let series = time_series(&[], &timeline, "A", "Paint", 1, now());

    let start = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 5, 17).unwrap().and_hms_opt(0, 0, 0).unwrap();
    assert_eq!(series.range.start, start);
    assert_eq!(series.range.end, end);
    assert_eq!(series.scheduled.len(), 1);
}

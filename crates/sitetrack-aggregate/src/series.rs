//! Real vs scheduled progress over time
//!
//! The real series replays the reports of a (tower, activity) in order and
//! emits the tower average after each one. The scheduled series comes from
//! the planned timeline. Both are clamped so the plotted line never goes
//! down: a report that lowers a floor's value still moves the latest-cell map,
//! but the chart keeps showing the previous high.

use std::collections::BTreeMap;

use chrono::Duration;
use sitetrack_core::{
    Checkpoint, DateRange, ProgressRecord, SeriesPoint, TimeSeries, Timestamp,
};

use crate::cells::chronological;
use crate::totals::mean_percent;

/// Days of margin on each side of the chart
pub const RANGE_MARGIN_DAYS: i64 = 7;

/// Raise every point to at least the value of its predecessor
pub fn clamp_monotonic(points: &mut [SeriesPoint]) {
    for i in 1..points.len() {
        if points[i].value < points[i - 1].value {
            points[i].value = points[i - 1].value;
        }
    }
}

/// Running tower average of an activity, one point per dated report.
///
/// Reports whose timestamp cannot be parsed still update their floor but do
/// not produce a point. A report for a floor outside `1..=floor_count` leaves
/// the average unchanged but still emits a point at its date.
pub fn real_series(
    records: &[ProgressRecord],
    tower: &str,
    activity: &str,
    floor_count: u32,
) -> Vec<SeriesPoint> {
    let relevant: Vec<ProgressRecord> = records
        .iter()
        .filter(|r| r.tower == tower && r.activity == activity)
        .cloned()
        .collect();

    let mut by_floor: BTreeMap<u32, u8> = (1..=floor_count).map(|f| (f, 0)).collect();
    let mut points = Vec::new();

    for (timestamp, record) in chronological(&relevant) {
        if let Some(value) = by_floor.get_mut(&record.floor) {
            *value = record.percent;
        }
        let Some(at) = timestamp else {
            continue;
        };
        let sum: u64 = by_floor.values().copied().map(u64::from).sum();
        points.push(SeriesPoint {
            at,
            value: mean_percent(sum, floor_count),
        });
    }

    clamp_monotonic(&mut points);
    points
}

/// Planned checkpoints in date order. Undated checkpoints are dropped.
pub fn scheduled_series(timeline: &[Checkpoint]) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = timeline
        .iter()
        .filter_map(|c| {
            c.parsed_date().map(|at| SeriesPoint {
                at,
                value: c.progress.min(100),
            })
        })
        .collect();
    points.sort_by_key(|p| p.at);

    clamp_monotonic(&mut points);
    points
}

/// Visible window: one week of margin around all points, or `now` when
/// there are none.
pub fn chart_range<'a>(
    points: impl IntoIterator<Item = &'a SeriesPoint>,
    now: Timestamp,
) -> DateRange {
    let mut bounds: Option<(Timestamp, Timestamp)> = None;
    for point in points {
        bounds = Some(match bounds {
            None => (point.at, point.at),
            Some((min, max)) => (min.min(point.at), max.max(point.at)),
        });
    }

    match bounds {
        Some((min, max)) => DateRange {
            start: min - Duration::days(RANGE_MARGIN_DAYS),
            end: max + Duration::days(RANGE_MARGIN_DAYS),
        },
        None => DateRange { start: now, end: now },
    }
}

/// Both series and the chart window for a (tower, activity)
pub fn time_series(
    records: &[ProgressRecord],
    timeline: &[Checkpoint],
    tower: &str,
    activity: &str,
    floor_count: u32,
    now: Timestamp,
) -> TimeSeries {
    let real = real_series(records, tower, activity, floor_count);
    let scheduled = scheduled_series(timeline);
    let range = chart_range(real.iter().chain(scheduled.iter()), now);

    TimeSeries {
        tower: tower.to_string(),
        activity: activity.to_string(),
        real,
        scheduled,
        range,
    }
}

/// Real progress against a scheduled checkpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Variance {
    pub at: Timestamp,
    pub scheduled: u8,
    /// Last real value at or before `at` (0 before the first report)
    pub real: u8,
}

impl Variance {
    /// Positive when ahead of schedule
    pub fn difference(&self) -> i16 {
        i16::from(self.real) - i16::from(self.scheduled)
    }
}

/// Compare each scheduled checkpoint with the real line at the same date
pub fn variances(series: &TimeSeries) -> Vec<Variance> {
    series
        .scheduled
        .iter()
        .map(|checkpoint| Variance {
            at: checkpoint.at,
            scheduled: checkpoint.value,
            real: series
                .real
                .iter()
                .take_while(|p| p.at <= checkpoint.at)
                .last()
                .map(|p| p.value)
                .unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn rec(floor: u32, percent: u8, d: u32) -> ProgressRecord {
        ProgressRecord::new("A", floor, "Paint", percent).at(format!("{:02}/03/2025", d))
    }

    fn values(points: &[SeriesPoint]) -> Vec<u8> {
        points.iter().map(|p| p.value).collect()
    }

    #[test]
    fn clamp_raises_dips() {
        let mut points = vec![
            SeriesPoint { at: day(1), value: 10 },
            SeriesPoint { at: day(2), value: 40 },
            SeriesPoint { at: day(3), value: 20 },
            SeriesPoint { at: day(4), value: 50 },
        ];
        clamp_monotonic(&mut points);
        assert_eq!(values(&points), vec![10, 40, 40, 50]);
    }

    #[test]
    fn real_series_running_average() {
        let records = vec![rec(2, 50, 5), rec(1, 100, 3), rec(3, 0, 7)];
        let points = real_series(&records, "A", "Paint", 3);

        assert_eq!(points.iter().map(|p| p.at).collect::<Vec<_>>(), vec![day(3), day(5), day(7)]);
        assert_eq!(values(&points), vec![33, 50, 50]);
    }

    #[test]
    fn real_series_filters_tower_and_activity() {
        let records = vec![
            rec(1, 100, 3),
            ProgressRecord::new("B", 1, "Paint", 100).at("03/03/2025"),
            ProgressRecord::new("A", 1, "Tiles", 100).at("03/03/2025"),
        ];
        assert_eq!(real_series(&records, "A", "Paint", 2).len(), 1);
    }

    #[test]
    fn undated_report_updates_floor_without_point() {
        let records = vec![
            ProgressRecord::new("A", 1, "Paint", 100).at("sometime"),
            rec(2, 100, 4),
        ];
        let points = real_series(&records, "A", "Paint", 2);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 100);
    }

    #[test]
    fn floor_outside_tower_repeats_average() {
        let records = vec![rec(1, 60, 3), rec(9, 100, 5), rec(2, 20, 7)];
        let points = real_series(&records, "A", "Paint", 2);

        assert_eq!(points.iter().map(|p| p.at).collect::<Vec<_>>(), vec![day(3), day(5), day(7)]);
        assert_eq!(values(&points), vec![30, 30, 40]);
    }

    #[test]
    fn rfc2822_report_gets_its_own_point() {
        let records = vec![
            ProgressRecord::new("A", 1, "Paint", 80).at("2025-03-01T09:00:00Z"),
            ProgressRecord::new("A", 1, "Paint", 100).at("Mon, 10 Mar 2025 09:00:00 GMT"),
        ];
        let points = real_series(&records, "A", "Paint", 1);
        assert_eq!(values(&points), vec![80, 100]);
    }

    #[test]
    fn scheduled_series_sorted_and_clamped() {
        let timeline = vec![
            Checkpoint::new("20/03/2025", 30),
            Checkpoint::new("01/03/2025", 10),
            Checkpoint::new("10/03/2025", 60),
            Checkpoint::new("garbage", 90),
        ];
        let points = scheduled_series(&timeline);
        assert_eq!(points.iter().map(|p| p.at).collect::<Vec<_>>(), vec![day(1), day(10), day(20)]);
        assert_eq!(values(&points), vec![10, 60, 60]);
    }

    #[test]
    fn range_has_week_margin() {
        let points = [
            SeriesPoint { at: day(10), value: 0 },
            SeriesPoint { at: day(20), value: 0 },
        ];
        let range = chart_range(points.iter(), day(1));
        assert_eq!(range.start, day(3));
        assert_eq!(range.end, day(27));
        assert_eq!(range.days(), 24);
    }

    #[test]
    fn empty_range_is_now() {
        let range = chart_range(std::iter::empty(), day(15));
        assert_eq!(range, DateRange { start: day(15), end: day(15) });
    }

    #[test]
    fn time_series_combines_both_ranges() {
        let records = vec![rec(1, 50, 10)];
        let timeline = vec![Checkpoint::new("01/03/2025", 0), Checkpoint::new("25/03/2025", 100)];

        let series = time_series(&records, &timeline, "A", "Paint", 1, day(1));
        assert_eq!(series.range.start, day(1) - Duration::days(7));
        assert_eq!(series.range.end, day(25) + Duration::days(7));
        assert_eq!(values(&series.real), vec![50]);
        assert_eq!(values(&series.scheduled), vec![0, 100]);
    }

    #[test]
    fn variance_against_checkpoints() {
        let records = vec![rec(1, 40, 5), rec(1, 70, 15)];
        let timeline = vec![
            Checkpoint::new("01/03/2025", 10),
            Checkpoint::new("10/03/2025", 50),
            Checkpoint::new("20/03/2025", 60),
        ];
        let series = time_series(&records, &timeline, "A", "Paint", 1, day(1));

        let diffs: Vec<i16> = variances(&series).iter().map(Variance::difference).collect();
        assert_eq!(diffs, vec![-10, -10, 10]);
    }
}

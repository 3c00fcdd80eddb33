use chrono::{Datelike, NaiveDate};

use crate::config::ChartConfig;
use crate::history::PlayEvent;

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: u32 = 3_600;

/// Linear interpolation between `b` and `e`.
pub fn lerp(b: f64, e: f64, t: f64) -> f64 {
    b * (1.0 - t) + e * t
}

/// Project `v` in `[b1, e1]` onto `[b2, e2]`.
pub fn project(v: f64, b1: f64, e1: f64, b2: f64, e2: f64) -> f64 {
    lerp(b2, e2, (v - b1) / (e1 - b1))
}

fn jan1(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).expect("January 1st is always valid")
}

// Timezone-blind epoch of a year's start. Naive on purpose: no DST.
fn year_start_epoch(year: i32) -> i64 {
    jan1(year)
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp()
}

/// The calendar-axis value of an event: seconds from the start of that
/// day's year, plus the time-of-day offset, anchored at the year's naive
/// epoch. Deliberately NOT a real timestamp: local wall-clock evenings
/// line up across daylight-saving shifts, at the cost of a small accepted
/// misalignment at exact year boundaries.
pub fn chart_instant(day: NaiveDate, seconds: u32) -> i64 {
    let since_year_start = (day - jan1(day.year())).num_days() * SECS_PER_DAY;
    year_start_epoch(day.year()) + since_year_start + i64::from(seconds)
}

/// Chart coordinate space: a fixed pixel viewBox with a label gutter on the
/// left, calendar time running right, and the evening window running down.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub width: f64,
    pub height: f64,
    /// Where the dance name ends and the graph starts.
    pub offset: f64,
    pub radius: f64,
    start_year: i32,
    end_year: i32,
    evening_start: u32,
    evening_end: u32,
    range_start: i64,
    range_end: i64,
}

impl Geometry {
    pub fn new(chart: &ChartConfig) -> Self {
        Self {
            width: f64::from(chart.width),
            height: f64::from(chart.height),
            offset: f64::from(chart.offset),
            radius: f64::from(chart.radius),
            start_year: chart.start_year,
            end_year: chart.end_year,
            evening_start: chart.evening_start_hour * SECS_PER_HOUR,
            evening_end: chart.evening_end_hour * SECS_PER_HOUR,
            range_start: year_start_epoch(chart.start_year),
            range_end: year_start_epoch(chart.end_year),
        }
    }

    /// Horizontal position of an event within the calendar range.
    pub fn x(&self, event: &PlayEvent) -> f64 {
        project(
            chart_instant(event.day, event.seconds) as f64,
            self.range_start as f64,
            self.range_end as f64,
            self.offset,
            self.width,
        )
    }

    /// Vertical position of an event within the evening window, or `None`
    /// when it projects above the visible range. Positions below the chart
    /// are kept; only negative ones are dropped.
    pub fn y(&self, event: &PlayEvent) -> Option<f64> {
        let y = project(
            f64::from(event.seconds),
            f64::from(self.evening_start),
            f64::from(self.evening_end),
            0.0,
            self.height,
        );
        (y >= 0.0).then_some(y)
    }

    /// Vertical midpoint, where the label text sits.
    pub fn label_y(&self) -> f64 {
        self.height / 2.0
    }

    /// Y of each whole-hour reference line across the evening window.
    pub fn hour_lines(&self) -> Vec<f64> {
        let first = self.evening_start / SECS_PER_HOUR;
        let last = self.evening_end / SECS_PER_HOUR;
        (first..=last)
            .map(|hour| {
                project(
                    f64::from(hour * SECS_PER_HOUR),
                    f64::from(self.evening_start),
                    f64::from(self.evening_end),
                    0.0,
                    self.height,
                )
            })
            .collect()
    }

    /// X of each whole-year boundary line across the calendar range.
    pub fn year_lines(&self) -> Vec<f64> {
        let years = self.end_year - self.start_year;
        (0..=years)
            .map(|n| project(f64::from(n), 0.0, f64::from(years), self.offset, self.width))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartConfig;

    fn geometry() -> Geometry {
        Geometry::new(&ChartConfig::default())
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn project_is_the_exact_linear_transform() {
        assert_eq!(project(5.0, 0.0, 10.0, 0.0, 100.0), 50.0);
        assert_eq!(project(0.0, 0.0, 10.0, 200.0, 1000.0), 200.0);
        assert_eq!(project(10.0, 0.0, 10.0, 200.0, 1000.0), 1000.0);
        // Out-of-range values extrapolate linearly.
        assert_eq!(project(-5.0, 0.0, 10.0, 0.0, 100.0), -50.0);
    }

    #[test]
    fn instants_ignore_daylight_saving() {
        // Two evenings straddling the EU spring-forward date: the naive
        // model keeps them exactly two days apart.
        let before = chart_instant(date("2022-03-26"), 20 * 3600);
        let after = chart_instant(date("2022-03-28"), 20 * 3600);
        assert_eq!(after - before, 2 * 86_400);
    }

    #[test]
    fn instants_are_continuous_across_year_boundary() {
        let last = chart_instant(date("2021-12-31"), 0);
        let first = chart_instant(date("2022-01-01"), 0);
        assert_eq!(first - last, 86_400);
    }

    #[test]
    fn instant_includes_time_of_day() {
        let midnight = chart_instant(date("2022-06-01"), 0);
        let evening = chart_instant(date("2022-06-01"), 20 * 3600);
        assert_eq!(evening - midnight, 20 * 3600);
    }

    #[test]
    fn x_spans_label_offset_to_width() {
        let geom = geometry();
        let start = PlayEvent { day: date("2021-01-01"), seconds: 0 };
        assert_eq!(geom.x(&start), geom.offset);

        let end = PlayEvent { day: date("2026-01-01"), seconds: 0 };
        assert_eq!(geom.x(&end), geom.width);
    }

    #[test]
    fn y_maps_evening_window_onto_chart_height() {
        let geom = geometry();
        let at = |h: u32, m: u32| PlayEvent {
            day: date("2022-06-01"),
            seconds: h * 3600 + m * 60,
        };
        assert_eq!(geom.y(&at(19, 0)), Some(0.0));
        assert_eq!(geom.y(&at(22, 0)), Some(geom.height));
        let mid = geom.y(&at(20, 30)).unwrap();
        assert!((mid - geom.height / 2.0).abs() < 1e-9);
    }

    #[test]
    fn events_above_window_are_dropped_below_are_kept() {
        let geom = geometry();
        let early = PlayEvent { day: date("2022-06-01"), seconds: 18 * 3600 };
        assert_eq!(geom.y(&early), None);

        let late = PlayEvent { day: date("2022-06-01"), seconds: 23 * 3600 };
        let y = geom.y(&late).unwrap();
        assert!(y > geom.height);
    }

    #[test]
    fn hour_lines_cover_the_window() {
        let lines = geometry().hour_lines();
        assert_eq!(lines.len(), 4);
        for (line, expected) in lines.iter().zip([0.0, 20.0, 40.0, 60.0]) {
            assert!((line - expected).abs() < 1e-9, "{line} vs {expected}");
        }
    }

    #[test]
    fn year_lines_cover_the_range() {
        let geom = geometry();
        let lines = geom.year_lines();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], geom.offset);
        assert_eq!(lines[5], geom.width);
    }
}

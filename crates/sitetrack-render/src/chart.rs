//! SVG line chart of real vs scheduled progress

use chrono::Duration;
use sitetrack_core::{ProjectConfig, RenderError, Renderer, SeriesPoint, TimeSeries, Timestamp};
use svg::node::element::{Circle, Group, Line, Polyline, Rectangle, Text};
use svg::Document;

use crate::write_svg;

/// SVG chart renderer configuration
#[derive(Clone, Debug)]
pub struct ChartSvgRenderer {
    /// Width of the plot area in pixels
    pub chart_width: u32,
    /// Height of the plot area in pixels
    pub chart_height: u32,
    /// Space left of the plot for the y axis
    pub axis_width: u32,
    pub padding: u32,
    /// Real series line color
    pub real_color: String,
    /// Scheduled series line color (drawn dashed)
    pub scheduled_color: String,
    pub grid_color: String,
    pub background_color: String,
    pub text_color: String,
    pub font_family: String,
    pub font_size: u32,
}

impl Default for ChartSvgRenderer {
    fn default() -> Self {
        Self {
            chart_width: 760,
            chart_height: 360,
            axis_width: 48,
            padding: 20,
            real_color: "#ea580c".into(),
            scheduled_color: "#6b7280".into(),
            grid_color: "#e5e7eb".into(),
            background_color: "#ffffff".into(),
            text_color: "#1f2937".into(),
            font_family: "system-ui, -apple-system, sans-serif".into(),
            font_size: 12,
        }
    }
}

impl ChartSvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.chart_width = width;
        self.chart_height = height;
        self
    }

    const TITLE_HEIGHT: u32 = 36;
    const X_AXIS_HEIGHT: u32 = 40;
    const LEGEND_HEIGHT: u32 = 28;

    fn plot_left(&self) -> f64 {
        (self.padding + self.axis_width) as f64
    }

    fn plot_top(&self) -> f64 {
        (self.padding + Self::TITLE_HEIGHT) as f64
    }

    fn plot_bottom(&self) -> f64 {
        self.plot_top() + self.chart_height as f64
    }

    fn total_width(&self) -> u32 {
        self.padding * 2 + self.axis_width + self.chart_width
    }

    fn total_height(&self) -> u32 {
        self.padding * 2
            + Self::TITLE_HEIGHT
            + self.chart_height
            + Self::X_AXIS_HEIGHT
            + Self::LEGEND_HEIGHT
    }

    /// Visible window, widened to one day when it is a single instant
    fn window(series: &TimeSeries) -> (Timestamp, Timestamp) {
        let (start, end) = (series.range.start, series.range.end);
        if end > start {
            (start, end)
        } else {
            (start - Duration::hours(12), start + Duration::hours(12))
        }
    }

    fn x(&self, at: Timestamp, start: Timestamp, end: Timestamp) -> f64 {
        let span = (end - start).num_seconds().max(1) as f64;
        let offset = (at - start).num_seconds() as f64;
        self.plot_left() + offset / span * self.chart_width as f64
    }

    fn y(&self, value: u8) -> f64 {
        self.plot_bottom() - f64::from(value.min(100)) / 100.0 * self.chart_height as f64
    }

    fn text(&self, content: impl Into<String>, x: f64, y: f64) -> Text {
        Text::new(content)
            .set("x", x)
            .set("y", y)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size)
            .set("fill", self.text_color.as_str())
    }

    fn render_axes(&self, start: Timestamp, end: Timestamp) -> Group {
        let mut group = Group::new().set("class", "axes");
        let left = self.plot_left();
        let right = left + self.chart_width as f64;

        for value in (0..=100u8).step_by(20) {
            let y = self.y(value);
            group = group.add(
                Line::new()
                    .set("x1", left)
                    .set("y1", y)
                    .set("x2", right)
                    .set("y2", y)
                    .set("stroke", self.grid_color.as_str())
                    .set("stroke-width", 1),
            );
            group = group.add(
                self.text(format!("{}%", value), left - 6.0, y + 4.0)
                    .set("text-anchor", "end"),
            );
        }

        let total_days = (end - start).num_days();
        let interval = if total_days <= 14 {
            1
        } else if total_days <= 90 {
            7
        } else if total_days <= 365 {
            30
        } else {
            90
        };

        let mut tick = start.date().and_hms_opt(0, 0, 0).unwrap_or(start);
        if tick < start {
            tick += Duration::days(1);
        }
        while tick <= end {
            let x = self.x(tick, start, end);
            group = group.add(
                Line::new()
                    .set("x1", x)
                    .set("y1", self.plot_top())
                    .set("x2", x)
                    .set("y2", self.plot_bottom())
                    .set("stroke", self.grid_color.as_str())
                    .set("stroke-width", 1),
            );
            group = group.add(
                self.text(tick.format("%b %d").to_string(), x, self.plot_bottom() + 16.0)
                    .set("text-anchor", "middle"),
            );
            tick += Duration::days(interval);
        }

        group = group.add(
            self.text("Date", left + self.chart_width as f64 / 2.0, self.plot_bottom() + 34.0)
                .set("text-anchor", "middle"),
        );

        group
    }

    fn render_line(
        &self,
        points: &[SeriesPoint],
        color: &str,
        dashed: bool,
        start: Timestamp,
        end: Timestamp,
    ) -> Group {
        let mut group = Group::new();
        let coords: Vec<String> = points
            .iter()
            .map(|p| format!("{:.1},{:.1}", self.x(p.at, start, end), self.y(p.value)))
            .collect();

        let mut line = Polyline::new()
            .set("points", coords.join(" "))
            .set("fill", "none")
            .set("stroke", color)
            .set("stroke-width", 2);
        if dashed {
            line = line.set("stroke-dasharray", "6 4");
        }
        group = group.add(line);

        for point in points {
            group = group.add(
                Circle::new()
                    .set("cx", self.x(point.at, start, end))
                    .set("cy", self.y(point.value))
                    .set("r", 3)
                    .set("fill", color),
            );
        }

        group
    }

    fn render_legend(&self, activity: &str) -> Group {
        let mut group = Group::new().set("class", "legend");
        let y = self.plot_bottom() + Self::X_AXIS_HEIGHT as f64 + 14.0;
        let x = self.plot_left();

        for (i, (label, color, dashed)) in [
            (format!("{} (Real)", activity), self.real_color.as_str(), false),
            (format!("{} (Scheduled)", activity), self.scheduled_color.as_str(), true),
        ]
        .into_iter()
        .enumerate()
        {
            let x = x + i as f64 * 220.0;
            let mut sample = Line::new()
                .set("x1", x)
                .set("y1", y - 4.0)
                .set("x2", x + 24.0)
                .set("y2", y - 4.0)
                .set("stroke", color)
                .set("stroke-width", 2);
            if dashed {
                sample = sample.set("stroke-dasharray", "6 4");
            }
            group = group.add(sample);
            group = group.add(self.text(label, x + 30.0, y));
        }

        group
    }
}

impl Renderer<TimeSeries> for ChartSvgRenderer {
    type Output = String;

    fn render(&self, config: &ProjectConfig, series: &TimeSeries) -> Result<String, RenderError> {
        let width = self.total_width();
        let height = self.total_height();

        let mut document = Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height))
            .set("xmlns", "http://www.w3.org/2000/svg");

        document = document.add(
            Rectangle::new()
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", self.background_color.as_str()),
        );
        document = document.add(
            self.text(
                format!("{} - Tower {} - {}", config.name, series.tower, series.activity),
                self.padding as f64,
                (self.padding + 18) as f64,
            )
            .set("font-size", self.font_size + 4)
            .set("font-weight", "bold"),
        );

        let (start, end) = Self::window(series);
        document = document.add(self.render_axes(start, end));

        if series.is_empty() {
            document = document.add(
                self.text(
                    "No data to show",
                    self.plot_left() + self.chart_width as f64 / 2.0,
                    self.plot_top() + self.chart_height as f64 / 2.0,
                )
                .set("text-anchor", "middle"),
            );
        } else {
            if !series.scheduled.is_empty() {
                document = document.add(
                    self.render_line(&series.scheduled, &self.scheduled_color, true, start, end)
                        .set("class", "scheduled"),
                );
            }
            if !series.real.is_empty() {
                document = document.add(
                    self.render_line(&series.real, &self.real_color, false, start, end)
                        .set("class", "real"),
                );
            }
        }

        document = document.add(self.render_legend(&series.activity));

        write_svg(&document)
    }
}

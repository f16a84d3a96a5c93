//! Plain-text tables for terminal output

use std::fmt::Write;

use sitetrack_aggregate::variances;
use sitetrack_core::{ProjectConfig, ProjectSummary, RenderError, Renderer, TimeSeries, TowerMatrix};

use crate::{percent_label, truncate};

/// Fixed-width text renderer
#[derive(Clone, Debug)]
pub struct TextRenderer {
    /// Width of an activity column in characters
    pub column_width: usize,
    /// Show the planned percentage next to the real one
    pub show_planned: bool,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            column_width: 12,
            show_planned: false,
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_planned(mut self) -> Self {
        self.show_planned = true;
        // "100%/100%"
        self.column_width = self.column_width.max(10);
        self
    }

    pub fn column_width(mut self, width: usize) -> Self {
        self.column_width = width.max(5);
        self
    }

    fn cell(&self, real: Option<u8>, planned: Option<u8>) -> String {
        if self.show_planned {
            format!("{}/{}", percent_label(real), percent_label(planned))
        } else {
            percent_label(real)
        }
    }
}

fn fmt_err(e: std::fmt::Error) -> RenderError {
    RenderError::Format(e.to_string())
}

impl Renderer<TowerMatrix> for TextRenderer {
    type Output = String;

    fn render(&self, config: &ProjectConfig, matrix: &TowerMatrix) -> Result<String, RenderError> {
        let w = self.column_width;
        let mut out = String::new();

        writeln!(out, "{} - Tower {}", config.name, matrix.tower).map_err(fmt_err)?;
        if self.show_planned {
            writeln!(out, "(real/planned)").map_err(fmt_err)?;
        }
        writeln!(out).map_err(fmt_err)?;

        write!(out, "{:>6}", "Floor").map_err(fmt_err)?;
        for activity in &matrix.activities {
            write!(out, " {:>w$}", truncate(activity, w)).map_err(fmt_err)?;
        }
        writeln!(out).map_err(fmt_err)?;

        let rule = "-".repeat(6 + matrix.activities.len() * (w + 1));
        writeln!(out, "{}", rule).map_err(fmt_err)?;

        for row in &matrix.rows {
            write!(out, "{:>6}", row.floor).map_err(fmt_err)?;
            for cell in &row.cells {
                write!(out, " {:>w$}", self.cell(cell.real, cell.planned)).map_err(fmt_err)?;
            }
            writeln!(out).map_err(fmt_err)?;
        }

        writeln!(out, "{}", rule).map_err(fmt_err)?;
        write!(out, "{:>6}", "Total").map_err(fmt_err)?;
        for total in &matrix.totals {
            write!(out, " {:>w$}", self.cell(Some(total.real), Some(total.planned))).map_err(fmt_err)?;
        }
        writeln!(out).map_err(fmt_err)?;

        Ok(out)
    }
}

impl Renderer<TimeSeries> for TextRenderer {
    type Output = String;

    fn render(&self, config: &ProjectConfig, series: &TimeSeries) -> Result<String, RenderError> {
        let mut out = String::new();
        writeln!(
            out,
            "{} - Tower {} - {}",
            config.name, series.tower, series.activity
        )
        .map_err(fmt_err)?;

        if series.is_empty() {
            writeln!(out, "No data to show").map_err(fmt_err)?;
            return Ok(out);
        }

        writeln!(
            out,
            "Window: {} .. {}",
            series.range.start.format("%Y-%m-%d"),
            series.range.end.format("%Y-%m-%d")
        )
        .map_err(fmt_err)?;

        writeln!(out, "\nReal").map_err(fmt_err)?;
        if series.real.is_empty() {
            writeln!(out, "  (no reports)").map_err(fmt_err)?;
        }
        for point in &series.real {
            writeln!(out, "  {}  {:>3}%", point.at.format("%Y-%m-%d %H:%M"), point.value).map_err(fmt_err)?;
        }

        writeln!(out, "\nScheduled").map_err(fmt_err)?;
        if series.scheduled.is_empty() {
            writeln!(out, "  (no checkpoints)").map_err(fmt_err)?;
        }
        for variance in variances(series) {
            writeln!(
                out,
                "  {}  {:>3}%  real {:>3}%  difference {:+}%",
                variance.at.format("%Y-%m-%d"),
                variance.scheduled,
                variance.real,
                variance.difference()
            )
            .map_err(fmt_err)?;
        }

        Ok(out)
    }
}

impl Renderer<ProjectSummary> for TextRenderer {
    type Output = String;

    fn render(&self, config: &ProjectConfig, summary: &ProjectSummary) -> Result<String, RenderError> {
        let mut out = String::new();

        if !config.is_configured() {
            writeln!(out, "No project has been configured yet.").map_err(fmt_err)?;
            return Ok(out);
        }

        writeln!(out, "Project: {}", summary.project_name).map_err(fmt_err)?;
        writeln!(out, "\nTowers:").map_err(fmt_err)?;
        for tower in &summary.towers {
            writeln!(
                out,
                "  {:<16} {:>3} floors  {:>3}% done  {:>3}% planned",
                tower.tower, tower.floors, tower.progress, tower.planned
            )
            .map_err(fmt_err)?;
        }

        writeln!(out, "\nActivities:").map_err(fmt_err)?;
        for activity in &config.activities {
            writeln!(out, "  {}", activity).map_err(fmt_err)?;
        }

        writeln!(out).map_err(fmt_err)?;
        writeln!(
            out,
            "Cells: {} reported of {} ({}%), {} complete",
            summary.reported_cells,
            summary.total_cells,
            summary.coverage(),
            summary.completed_cells
        )
        .map_err(fmt_err)?;
        writeln!(out, "Overall progress: {}%", summary.overall_progress).map_err(fmt_err)?;
        let lag = summary.lag();
        if lag > 0 {
            writeln!(out, "Behind plan by {} points", lag).map_err(fmt_err)?;
        } else if lag < 0 {
            writeln!(out, "Ahead of plan by {} points", -lag).map_err(fmt_err)?;
        }
        writeln!(out, "Records: {}", summary.records).map_err(fmt_err)?;

        Ok(out)
    }
}

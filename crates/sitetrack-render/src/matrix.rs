//! SVG progress matrix
//!
//! One row per floor (top floor first), one column per selected activity.
//! Cells are filled with the color of their progress bucket. The last row
//! holds the tower average of each activity.

use sitetrack_core::{CellBucket, MatrixCell, ProjectConfig, RenderError, Renderer, TowerMatrix};
use svg::node::element::{Group, Line, Rectangle, Text};
use svg::Document;

use crate::{percent_label, truncate, write_svg};

/// SVG matrix renderer configuration
#[derive(Clone, Debug)]
pub struct MatrixSvgRenderer {
    /// Width of an activity column in pixels
    pub cell_width: u32,
    /// Height of a floor row in pixels
    pub cell_height: u32,
    /// Width of the floor label column in pixels
    pub label_width: u32,
    /// Height of the activity header row in pixels
    pub header_height: u32,
    /// Padding around the matrix
    pub padding: u32,
    /// Gap between cells
    pub gap: u32,
    /// Show the planned percentage under the real one
    pub show_planned: bool,
    /// Draw the color legend under the matrix
    pub show_legend: bool,
    /// Header and floor label background
    pub header_color: String,
    pub background_color: String,
    pub text_color: String,
    pub font_family: String,
    pub font_size: u32,
}

impl Default for MatrixSvgRenderer {
    fn default() -> Self {
        Self {
            cell_width: 110,
            cell_height: 40,
            label_width: 64,
            header_height: 36,
            padding: 20,
            gap: 4,
            show_planned: false,
            show_legend: true,
            header_color: "#fed7aa".into(),
            background_color: "#fff7ed".into(),
            text_color: "#1f2937".into(),
            font_family: "system-ui, -apple-system, sans-serif".into(),
            font_size: 13,
        }
    }
}

impl MatrixSvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show planned values next to the real ones
    pub fn with_planned(mut self) -> Self {
        self.show_planned = true;
        self
    }

    pub fn without_legend(mut self) -> Self {
        self.show_legend = false;
        self
    }

    pub fn cell_width(mut self, width: u32) -> Self {
        self.cell_width = width;
        self
    }

    const TITLE_HEIGHT: u32 = 36;
    const LEGEND_HEIGHT: u32 = 32;

    fn column_x(&self, col: usize) -> u32 {
        self.padding + self.label_width + self.gap + col as u32 * (self.cell_width + self.gap)
    }

    fn row_y(&self, row: usize) -> u32 {
        self.padding
            + Self::TITLE_HEIGHT
            + self.header_height
            + self.gap
            + row as u32 * (self.cell_height + self.gap)
    }

    fn total_width(&self, columns: usize) -> u32 {
        self.column_x(columns) + self.padding
    }

    fn total_height(&self, rows: usize) -> u32 {
        // floors + totals row
        let legend = if self.show_legend { Self::LEGEND_HEIGHT } else { 0 };
        self.row_y(rows + 1) + legend + self.padding
    }

    fn label(&self, text: &str, x: f64, y: f64) -> Text {
        Text::new(text)
            .set("x", x)
            .set("y", y)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size)
            .set("fill", self.text_color.as_str())
            .set("text-anchor", "middle")
            .set("dominant-baseline", "middle")
    }

    fn render_header(&self, matrix: &TowerMatrix) -> Group {
        let mut group = Group::new().set("class", "header");
        let y = self.padding + Self::TITLE_HEIGHT;

        let corner = Rectangle::new()
            .set("x", self.padding)
            .set("y", y)
            .set("width", self.label_width)
            .set("height", self.header_height)
            .set("rx", 4)
            .set("fill", self.header_color.as_str());
        group = group.add(corner);
        group = group.add(
            self.label(
                "Floor",
                (self.padding + self.label_width / 2) as f64,
                (y + self.header_height / 2) as f64,
            )
            .set("font-weight", "bold"),
        );

        let max_chars = (self.cell_width / 8).max(4) as usize;
        for (col, activity) in matrix.activities.iter().enumerate() {
            let x = self.column_x(col);
            let background = Rectangle::new()
                .set("x", x)
                .set("y", y)
                .set("width", self.cell_width)
                .set("height", self.header_height)
                .set("fill", self.header_color.as_str());
            group = group.add(background);
            group = group.add(
                self.label(
                    &truncate(activity, max_chars),
                    (x + self.cell_width / 2) as f64,
                    (y + self.header_height / 2) as f64,
                )
                .set("font-weight", "bold"),
            );
        }

        group
    }

    fn render_cell(&self, cell: &MatrixCell, x: u32, y: u32) -> Group {
        let bucket = cell.real_bucket();
        let mut group = Group::new()
            .set("class", format!("cell {}", bucket.as_str().replace(' ', "-")));

        let rect = Rectangle::new()
            .set("x", x)
            .set("y", y)
            .set("width", self.cell_width)
            .set("height", self.cell_height)
            .set("rx", 4)
            .set("fill", bucket.fill());
        group = group.add(rect);

        let cx = (x + self.cell_width / 2) as f64;
        let cy = (y + self.cell_height / 2) as f64;

        if self.show_planned {
            group = group.add(
                self.label(&percent_label(cell.real), cx, cy - 7.0)
                    .set("fill", bucket.text()),
            );
            group = group.add(
                self.label(&format!("plan {}", percent_label(cell.planned)), cx, cy + 9.0)
                    .set("font-size", self.font_size.saturating_sub(3))
                    .set("fill", bucket.text()),
            );
        } else {
            group = group.add(self.label(&percent_label(cell.real), cx, cy).set("fill", bucket.text()));
        }

        group
    }

    fn render_floor_label(&self, floor: u32, y: u32) -> Group {
        let background = Rectangle::new()
            .set("x", self.padding)
            .set("y", y)
            .set("width", self.label_width)
            .set("height", self.cell_height)
            .set("fill", self.header_color.as_str());
        Group::new().add(background).add(
            self.label(
                &floor.to_string(),
                (self.padding + self.label_width / 2) as f64,
                (y + self.cell_height / 2) as f64,
            )
            .set("font-weight", "bold"),
        )
    }

    fn render_totals(&self, matrix: &TowerMatrix, y: u32) -> Group {
        let mut group = Group::new().set("class", "totals");

        let separator = Line::new()
            .set("x1", self.padding)
            .set("y1", y - self.gap / 2)
            .set("x2", self.column_x(matrix.activities.len()))
            .set("y2", y - self.gap / 2)
            .set("stroke", self.text_color.as_str())
            .set("stroke-width", 1);
        group = group.add(separator);
        group = group.add(
            Rectangle::new()
                .set("x", self.padding)
                .set("y", y)
                .set("width", self.label_width)
                .set("height", self.cell_height)
                .set("fill", self.header_color.as_str()),
        );
        group = group.add(
            self.label(
                "Total",
                (self.padding + self.label_width / 2) as f64,
                (y + self.cell_height / 2) as f64,
            )
            .set("font-weight", "bold"),
        );

        for (col, activity) in matrix.activities.iter().enumerate() {
            let (real, planned) = matrix
                .total(activity)
                .map_or((0, 0), |t| (t.real, t.planned));
            let cell = MatrixCell {
                activity: activity.clone(),
                real: Some(real),
                planned: Some(planned),
                record: None,
            };
            group = group.add(self.render_cell(&cell, self.column_x(col), y));
        }

        group
    }

    fn render_legend(&self, y: u32) -> Group {
        let mut group = Group::new().set("class", "legend");
        let box_size = 12.0;
        let spacing = 92.0;
        let y = y as f64 + 18.0;

        for (i, bucket) in CellBucket::ALL.iter().enumerate() {
            let x = self.padding as f64 + i as f64 * spacing;
            group = group.add(
                Rectangle::new()
                    .set("x", x)
                    .set("y", y - box_size + 2.0)
                    .set("width", box_size)
                    .set("height", box_size)
                    .set("rx", 2)
                    .set("fill", bucket.fill()),
            );
            group = group.add(
                Text::new(bucket.label())
                    .set("x", x + box_size + 5.0)
                    .set("y", y)
                    .set("font-family", self.font_family.as_str())
                    .set("font-size", self.font_size.saturating_sub(2))
                    .set("fill", self.text_color.as_str()),
            );
        }

        group
    }
}

impl Renderer<TowerMatrix> for MatrixSvgRenderer {
    type Output = String;

    fn render(&self, config: &ProjectConfig, matrix: &TowerMatrix) -> Result<String, RenderError> {
        if matrix.activities.is_empty() {
            return Err(RenderError::InvalidData("No activities selected".into()));
        }
        if matrix.rows.is_empty() {
            return Err(RenderError::InvalidData(format!("Tower {} has no floors", matrix.tower)));
        }

        let width = self.total_width(matrix.activities.len());
        let height = self.total_height(matrix.rows.len());

        let mut document = Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0, 0, width, height))
            .set("xmlns", "http://www.w3.org/2000/svg");

        let background = Rectangle::new()
            .set("width", "100%")
            .set("height", "100%")
            .set("fill", self.background_color.as_str());
        document = document.add(background);

        let title = Text::new(format!("{} - Tower {}", config.name, matrix.tower))
            .set("x", self.padding)
            .set("y", self.padding + 18)
            .set("font-family", self.font_family.as_str())
            .set("font-size", self.font_size + 4)
            .set("font-weight", "bold")
            .set("fill", self.text_color.as_str());
        document = document.add(title);

        document = document.add(self.render_header(matrix));

        for (row_index, row) in matrix.rows.iter().enumerate() {
            let y = self.row_y(row_index);
            let mut group = Group::new()
                .set("class", "floor")
                .set("data-floor", row.floor);
            group = group.add(self.render_floor_label(row.floor, y));
            for (col, cell) in row.cells.iter().enumerate() {
                group = group.add(self.render_cell(cell, self.column_x(col), y));
            }
            document = document.add(group);
        }

        let totals_y = self.row_y(matrix.rows.len());
        document = document.add(self.render_totals(matrix, totals_y));

        if self.show_legend {
            document = document.add(self.render_legend(totals_y + self.cell_height + self.gap));
        }

        write_svg(&document)
    }
}

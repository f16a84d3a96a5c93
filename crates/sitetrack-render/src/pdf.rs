//! Printable PDF report of a tower matrix
//!
//! One A4 landscape page: the report header (title, project, tower, date),
//! the floors × activities grid colored by bucket with a totals row, the
//! color legend and a footer. Text uses the built-in Helvetica faces, so
//! nothing is embedded.

use chrono::NaiveDate;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, path::PaintMode, PdfDocument, PdfLayerReference, Rect, Rgb,
};
use sitetrack_core::{CellBucket, ProjectConfig, RenderError, TowerMatrix};

use crate::{percent_label, truncate};

const HEADER_FILL: &str = "#fed7aa";
const TOTAL_FILL: &str = "#e2efda";
const RULE: &str = "#ea580c";
const INK: &str = "#1f2937";
const MUTED: &str = "#6b7280";
const GRID: &str = "#9ca3af";

/// Millimetres per typographic point
const MM_PER_PT: f32 = 0.3528;

/// PDF report renderer
#[derive(Clone, Debug)]
pub struct PdfRenderer {
    /// Page width in millimetres
    pub page_width: f32,
    /// Page height in millimetres
    pub page_height: f32,
    /// Page margin in millimetres
    pub margin: f32,
    /// Width of the floor column
    pub floor_width: f32,
    /// Upper bound for activity column width
    pub max_column_width: f32,
    /// Upper bound for row height
    pub max_row_height: f32,
    /// Draw the color legend under the grid
    pub show_legend: bool,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            page_width: 297.0,
            page_height: 210.0,
            margin: 12.0,
            floor_width: 18.0,
            max_column_width: 40.0,
            max_row_height: 8.0,
            show_legend: true,
        }
    }
}

fn pdf_err(e: printpdf::Error) -> RenderError {
    RenderError::Format(format!("Failed to create PDF: {e}"))
}

/// Parse "#rrggbb" into a PDF color
fn rgb(hex: &str) -> Color {
    let value = u32::from_str_radix(hex.trim_start_matches('#'), 16).unwrap_or(0xFFFFFF);
    let channel = |shift: u32| ((value >> shift) & 0xFF) as f32 / 255.0;
    Color::Rgb(Rgb::new(channel(16), channel(8), channel(0), None))
}

/// Rough Helvetica advance, enough to center short labels
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.52 * MM_PER_PT
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Grid geometry for one matrix
struct Grid {
    left: f32,
    top: f32,
    column: f32,
    row: f32,
    font_size: f32,
}

impl Grid {
    fn x(&self, col: usize, floor_width: f32) -> f32 {
        if col == 0 {
            self.left
        } else {
            self.left + floor_width + (col - 1) as f32 * self.column
        }
    }

    /// Bottom edge of grid row `index` (0 is the header row)
    fn y(&self, index: usize) -> f32 {
        self.top - (index + 1) as f32 * self.row
    }
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn portrait(mut self) -> Self {
        std::mem::swap(&mut self.page_width, &mut self.page_height);
        self
    }

    pub fn without_legend(mut self) -> Self {
        self.show_legend = false;
        self
    }

    /// Render the report for `matrix` dated `date`
    pub fn render_report(
        &self,
        config: &ProjectConfig,
        matrix: &TowerMatrix,
        title: &str,
        date: NaiveDate,
    ) -> Result<Vec<u8>, RenderError> {
        if matrix.is_empty() {
            return Err(RenderError::InvalidData("No floors or activities to export".into()));
        }

        let doc_title = format!("{title} - {}", config.name);
        let (doc, page, layer) =
            PdfDocument::new(doc_title, Mm(self.page_width), Mm(self.page_height), "Report");
        let fonts = Fonts {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
        };
        let layer = doc.get_page(page).get_layer(layer);

        let grid_top = self.draw_header(&layer, &fonts, config, matrix, title, date);
        let grid = self.layout(matrix, grid_top);
        self.draw_grid(&layer, &fonts, matrix, &grid);
        if self.show_legend {
            self.draw_legend(&layer, &fonts, grid.y(matrix.rows.len() + 1) - 8.0);
        }
        self.draw_footer(&layer, &fonts, config);

        doc.save_to_bytes().map_err(pdf_err)
    }

    /// Title and the project/tower/date line. Returns the top of the grid.
    fn draw_header(
        &self,
        layer: &PdfLayerReference,
        fonts: &Fonts,
        config: &ProjectConfig,
        matrix: &TowerMatrix,
        title: &str,
        date: NaiveDate,
    ) -> f32 {
        let top = self.page_height - self.margin;
        layer.set_fill_color(rgb(INK));
        layer.use_text(title, 18.0, Mm(self.margin), Mm(top - 7.0), &fonts.bold);

        let fields = [
            ("Project:", config.name.clone()),
            ("Tower:", matrix.tower.clone()),
            ("Date:", date.format("%Y-%m-%d").to_string()),
        ];
        let mut x = self.margin;
        for (label, value) in &fields {
            layer.use_text(*label, 10.0, Mm(x), Mm(top - 14.0), &fonts.bold);
            x += text_width(label, 10.0) + 2.0;
            layer.use_text(value.as_str(), 10.0, Mm(x), Mm(top - 14.0), &fonts.regular);
            x += text_width(value, 10.0) + 10.0;
        }

        self.fill_rect(layer, RULE, self.margin, top - 17.5, self.page_width - self.margin, top - 17.0);
        top - 22.0
    }

    fn layout(&self, matrix: &TowerMatrix, top: f32) -> Grid {
        let usable_width = self.page_width - 2.0 * self.margin - self.floor_width;
        let column = (usable_width / matrix.activities.len() as f32).min(self.max_column_width);

        // header, floors, totals; legend and footer below
        let reserved = if self.show_legend { 30.0 } else { 20.0 };
        let usable_height = top - self.margin - reserved;
        let row = (usable_height / (matrix.rows.len() + 2) as f32).min(self.max_row_height);
        let font_size = (row / MM_PER_PT * 0.55).clamp(4.0, 9.0);

        Grid {
            left: self.margin,
            top,
            column,
            row,
            font_size,
        }
    }

    fn draw_grid(&self, layer: &PdfLayerReference, fonts: &Fonts, matrix: &TowerMatrix, grid: &Grid) {
        let max_chars = ((grid.column / (grid.font_size * 0.52 * MM_PER_PT)) as usize).max(3);

        self.cell(layer, &fonts.bold, grid, 0, 0, "Floor", HEADER_FILL, INK);
        for (i, activity) in matrix.activities.iter().enumerate() {
            let label = truncate(activity, max_chars);
            self.cell(layer, &fonts.bold, grid, 0, i + 1, &label, HEADER_FILL, INK);
        }

        for (r, floor_row) in matrix.rows.iter().enumerate() {
            let index = r + 1;
            let floor = floor_row.floor.to_string();
            self.cell(layer, &fonts.bold, grid, index, 0, &floor, HEADER_FILL, INK);
            for (c, cell) in floor_row.cells.iter().enumerate() {
                let bucket = cell.real_bucket();
                let label = percent_label(cell.real);
                self.cell(layer, &fonts.regular, grid, index, c + 1, &label, bucket.fill(), bucket.text());
            }
        }

        let index = matrix.rows.len() + 1;
        self.cell(layer, &fonts.bold, grid, index, 0, "Total", TOTAL_FILL, INK);
        for (c, total) in matrix.totals.iter().enumerate() {
            let label = percent_label(Some(total.real));
            self.cell(layer, &fonts.bold, grid, index, c + 1, &label, TOTAL_FILL, INK);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn cell(
        &self,
        layer: &PdfLayerReference,
        font: &IndirectFontRef,
        grid: &Grid,
        row: usize,
        col: usize,
        text: &str,
        fill: &str,
        ink: &str,
    ) {
        let x = grid.x(col, self.floor_width);
        let width = if col == 0 { self.floor_width } else { grid.column };
        let y = grid.y(row);

        layer.set_fill_color(rgb(fill));
        layer.set_outline_color(rgb(GRID));
        layer.set_outline_thickness(0.3);
        layer.add_rect(Rect::new(Mm(x), Mm(y), Mm(x + width), Mm(y + grid.row)).with_mode(PaintMode::FillStroke));

        let text_x = x + (width - text_width(text, grid.font_size)) / 2.0;
        let text_y = y + (grid.row - grid.font_size * MM_PER_PT * 0.7) / 2.0;
        layer.set_fill_color(rgb(ink));
        layer.use_text(text, grid.font_size, Mm(text_x.max(x)), Mm(text_y), font);
    }

    fn draw_legend(&self, layer: &PdfLayerReference, fonts: &Fonts, y: f32) {
        let mut x = self.margin;
        for bucket in CellBucket::ALL {
            self.fill_rect(layer, bucket.fill(), x, y, x + 4.0, y + 4.0);
            layer.set_fill_color(rgb(INK));
            layer.use_text(bucket.label(), 8.0, Mm(x + 5.5), Mm(y + 0.8), &fonts.regular);
            x += 5.5 + text_width(bucket.label(), 8.0) + 6.0;
        }
    }

    fn draw_footer(&self, layer: &PdfLayerReference, fonts: &Fonts, config: &ProjectConfig) {
        let y = self.margin;
        self.fill_rect(layer, GRID, self.margin, y + 5.0, self.page_width - self.margin, y + 5.3);

        layer.set_fill_color(rgb(MUTED));
        layer.use_text(config.name.as_str(), 8.0, Mm(self.margin), Mm(y), &fonts.regular);
        let page = "Page 1 of 1";
        let x = self.page_width - self.margin - text_width(page, 8.0);
        layer.use_text(page, 8.0, Mm(x), Mm(y), &fonts.regular);
    }

    fn fill_rect(&self, layer: &PdfLayerReference, fill: &str, x1: f32, y1: f32, x2: f32, y2: f32) {
        layer.set_fill_color(rgb(fill));
        layer.add_rect(Rect::new(Mm(x1), Mm(y1), Mm(x2), Mm(y2)).with_mode(PaintMode::Fill));
    }
}

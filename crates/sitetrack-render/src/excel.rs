//! Excel workbook of a tower matrix
//!
//! Sheets:
//! - Progress: floors × activities with the latest real percentage, filled
//!   with the bucket color, plus a totals row
//! - Planned: the same grid read from the scheduled baseline
//! - Records: the record behind every reported cell (date, user, note)

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use sitetrack_core::{CellBucket, ProjectConfig, RenderError, Renderer, TowerMatrix};

/// Excel renderer
#[derive(Clone, Debug)]
pub struct ExcelRenderer {
    /// Include the Planned sheet
    pub include_planned: bool,
    /// Include the Records sheet
    pub include_records: bool,
    /// Width of activity columns
    pub column_width: f64,
}

impl Default for ExcelRenderer {
    fn default() -> Self {
        Self {
            include_planned: true,
            include_records: true,
            column_width: 14.0,
        }
    }
}

/// Parse "#rrggbb" into the integer color rust_xlsxwriter expects
fn hex_color(hex: &str) -> u32 {
    u32::from_str_radix(hex.trim_start_matches('#'), 16).unwrap_or(0xFFFFFF)
}

fn xlsx_err(e: rust_xlsxwriter::XlsxError) -> RenderError {
    RenderError::Format(e.to_string())
}

struct ExcelFormats {
    title: Format,
    header: Format,
    floor: Format,
    text: Format,
    total: Format,
}

impl ExcelFormats {
    fn new() -> Self {
        Self {
            title: Format::new().set_bold().set_font_size(14),
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(0xFED7AA)
                .set_border(FormatBorder::Thin),
            floor: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(0xFED7AA)
                .set_border(FormatBorder::Thin),
            text: Format::new().set_border(FormatBorder::Thin),
            total: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_background_color(0xE2EFDA)
                .set_border(FormatBorder::Thin),
        }
    }

    /// Cell format for a bucket
    fn bucket(bucket: CellBucket) -> Format {
        Format::new()
            .set_align(FormatAlign::Center)
            .set_background_color(hex_color(bucket.fill()))
            .set_font_color(hex_color(bucket.text()))
            .set_border(FormatBorder::Thin)
    }
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_planned(mut self) -> Self {
        self.include_planned = false;
        self
    }

    pub fn no_records(mut self) -> Self {
        self.include_records = false;
        self
    }

    /// Generate workbook bytes
    pub fn render_to_bytes(
        &self,
        config: &ProjectConfig,
        matrix: &TowerMatrix,
    ) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let formats = ExcelFormats::new();

        self.add_grid_sheet(&mut workbook, config, matrix, &formats, "Progress", false)?;
        if self.include_planned {
            self.add_grid_sheet(&mut workbook, config, matrix, &formats, "Planned", true)?;
        }
        if self.include_records {
            self.add_records_sheet(&mut workbook, matrix, &formats)?;
        }

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    fn write_header(
        &self,
        sheet: &mut Worksheet,
        title: &str,
        matrix: &TowerMatrix,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        sheet
            .write_with_format(0, 0, title, &formats.title)
            .map_err(xlsx_err)?;
        sheet
            .write_with_format(2, 0, "Floor", &formats.header)
            .map_err(xlsx_err)?;
        sheet.set_column_width(0, 8).map_err(xlsx_err)?;

        for (col, activity) in matrix.activities.iter().enumerate() {
            let col = col as u16 + 1;
            sheet
                .write_with_format(2, col, activity.as_str(), &formats.header)
                .map_err(xlsx_err)?;
            sheet.set_column_width(col, self.column_width).map_err(xlsx_err)?;
        }
        Ok(())
    }

    fn add_grid_sheet(
        &self,
        workbook: &mut Workbook,
        config: &ProjectConfig,
        matrix: &TowerMatrix,
        formats: &ExcelFormats,
        name: &str,
        planned: bool,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name).map_err(xlsx_err)?;

        let title = format!("{} - Tower {} ({})", config.name, matrix.tower, name.to_lowercase());
        self.write_header(sheet, &title, matrix, formats)?;

        let mut row = 3u32;
        for floor_row in &matrix.rows {
            sheet
                .write_with_format(row, 0, floor_row.floor, &formats.floor)
                .map_err(xlsx_err)?;

            for (col, cell) in floor_row.cells.iter().enumerate() {
                let col = col as u16 + 1;
                let (value, bucket) = if planned {
                    (cell.planned, cell.planned_bucket())
                } else {
                    (cell.real, cell.real_bucket())
                };
                let format = ExcelFormats::bucket(bucket);
                match value {
                    Some(v) => sheet.write_with_format(row, col, f64::from(v) / 100.0, &format.set_num_format("0%")),
                    None => sheet.write_with_format(row, col, "-", &format),
                }
                .map_err(xlsx_err)?;
            }
            row += 1;
        }

        sheet
            .write_with_format(row, 0, "Total", &formats.total)
            .map_err(xlsx_err)?;
        for (col, total) in matrix.totals.iter().enumerate() {
            let value = if planned { total.planned } else { total.real };
            sheet
                .write_with_format(
                    row,
                    col as u16 + 1,
                    f64::from(value) / 100.0,
                    &formats.total.clone().set_num_format("0%"),
                )
                .map_err(xlsx_err)?;
        }

        sheet.set_freeze_panes(3, 1).map_err(xlsx_err)?;
        Ok(())
    }

    fn add_records_sheet(
        &self,
        workbook: &mut Workbook,
        matrix: &TowerMatrix,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Records").map_err(xlsx_err)?;

        let headers = ["Date", "User", "Floor", "Activity", "Progress", "Note"];
        let widths = [20, 16, 8, 20, 10, 40];
        for (col, (header, width)) in headers.iter().zip(widths).enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header)
                .map_err(xlsx_err)?;
            sheet.set_column_width(col as u16, width).map_err(xlsx_err)?;
        }

        let mut row = 1u32;
        for record in matrix
            .rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .filter_map(|c| c.record.as_ref())
        {
            sheet
                .write_with_format(row, 0, record.display_date(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 1, record.user.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 2, record.floor, &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 3, record.activity.as_str(), &formats.text)
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 4, f64::from(record.percent) / 100.0, &formats.text.clone().set_num_format("0%"))
                .map_err(xlsx_err)?;
            sheet
                .write_with_format(row, 5, record.note.as_deref().unwrap_or(""), &formats.text)
                .map_err(xlsx_err)?;
            row += 1;
        }

        Ok(())
    }
}

impl Renderer<TowerMatrix> for ExcelRenderer {
    type Output = Vec<u8>;

    fn render(&self, config: &ProjectConfig, matrix: &TowerMatrix) -> Result<Vec<u8>, RenderError> {
        if matrix.is_empty() {
            return Err(RenderError::InvalidData("No floors or activities to export".into()));
        }
        self.render_to_bytes(config, matrix)
    }
}

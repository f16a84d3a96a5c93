//! Report export
//!
//! An [`ExportToolkit`] is built once at start-up with the formats it can
//! produce and is handed to whatever needs to export. Asking it for a format
//! it was not built with is an error; capabilities are not rechecked at
//! export time.
//!
//! Report files are named
//! `progress_report_<project>_<tower>_<YYYY-MM-DD>.<ext>`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use sitetrack_core::{ProjectConfig, RenderError, Renderer, TowerMatrix};
use thiserror::Error;

use crate::{ExcelRenderer, MatrixSvgRenderer, PdfRenderer};

/// Report title
pub const REPORT_TITLE: &str = "Construction Progress Report";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export format '{format}' is not available (available: {available})")]
    Unsupported { format: ExportFormat, available: String },

    #[error("Unknown export format '{0}' (expected html, pdf, svg or xlsx)")]
    UnknownFormat(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output format of a report
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Print-ready HTML page with the matrix embedded
    Html,
    /// Single-page printable report
    Pdf,
    /// Matrix image only
    Svg,
    /// Excel workbook
    Xlsx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Html,
        ExportFormat::Pdf,
        ExportFormat::Svg,
        ExportFormat::Xlsx,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Svg => "svg",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Html => "text/html",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" | "htm" => Ok(ExportFormat::Html),
            "pdf" => Ok(ExportFormat::Pdf),
            "svg" => Ok(ExportFormat::Svg),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

/// Replace everything but ASCII letters, digits, `-` and `_` with `_`
pub fn sanitize_file_part(part: &str) -> String {
    let cleaned: String = part
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// `progress_report_<project>_<tower>_<YYYY-MM-DD>.<ext>`
pub fn report_file_name(project: &str, tower: &str, date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "progress_report_{}_{}_{}.{}",
        sanitize_file_part(project),
        sanitize_file_part(tower),
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// A rendered report ready to be written
#[derive(Clone, Debug)]
pub struct ExportedReport {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportedReport {
    /// Write into `dir` under the report's file name
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Export capability: the set of formats and the renderers behind them
#[derive(Clone, Debug)]
pub struct ExportToolkit {
    formats: Vec<ExportFormat>,
    matrix: MatrixSvgRenderer,
    excel: ExcelRenderer,
    pdf: PdfRenderer,
}

impl Default for ExportToolkit {
    fn default() -> Self {
        Self::with_formats(ExportFormat::ALL)
    }
}

impl ExportToolkit {
    /// Toolkit that can produce every format
    pub fn new() -> Self {
        Self::default()
    }

    /// Toolkit restricted to `formats`
    pub fn with_formats(formats: impl IntoIterator<Item = ExportFormat>) -> Self {
        let mut list: Vec<ExportFormat> = Vec::new();
        for format in formats {
            if !list.contains(&format) {
                list.push(format);
            }
        }
        Self {
            formats: list,
            matrix: MatrixSvgRenderer::new(),
            excel: ExcelRenderer::new(),
            pdf: PdfRenderer::new(),
        }
    }

    /// Use a customized matrix renderer for SVG and HTML output
    pub fn matrix_renderer(mut self, renderer: MatrixSvgRenderer) -> Self {
        self.matrix = renderer;
        self
    }

    /// Use a customized PDF renderer
    pub fn pdf_renderer(mut self, renderer: PdfRenderer) -> Self {
        self.pdf = renderer;
        self
    }

    pub fn formats(&self) -> &[ExportFormat] {
        &self.formats
    }

    pub fn supports(&self, format: ExportFormat) -> bool {
        self.formats.contains(&format)
    }

    /// Render the report of a tower matrix
    pub fn export(
        &self,
        config: &ProjectConfig,
        matrix: &TowerMatrix,
        format: ExportFormat,
        date: NaiveDate,
    ) -> Result<ExportedReport, ExportError> {
        if !self.supports(format) {
            let available = self
                .formats
                .iter()
                .map(ExportFormat::extension)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ExportError::Unsupported { format, available });
        }

        let bytes = match format {
            ExportFormat::Svg => self.matrix.render(config, matrix)?.into_bytes(),
            ExportFormat::Html => self.html_report(config, matrix, date)?.into_bytes(),
            ExportFormat::Pdf => self.pdf.render_report(config, matrix, REPORT_TITLE, date)?,
            ExportFormat::Xlsx => self.excel.render(config, matrix)?,
        };

        Ok(ExportedReport {
            file_name: report_file_name(&config.name, &matrix.tower, date, format),
            format,
            bytes,
        })
    }

    fn html_report(
        &self,
        config: &ProjectConfig,
        matrix: &TowerMatrix,
        date: NaiveDate,
    ) -> Result<String, RenderError> {
        let svg = self.matrix.render(config, matrix)?;
        let project = escape_html(&config.name);
        let tower = escape_html(&matrix.tower);

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - {project}</title>
<style>
  @page {{ size: A4 landscape; margin: 12mm; }}
  body {{ font-family: system-ui, -apple-system, sans-serif; color: #1f2937; margin: 0; }}
  header {{ border-bottom: 2px solid #ea580c; margin-bottom: 16px; padding-bottom: 8px; }}
  header h1 {{ font-size: 20px; margin: 0 0 6px 0; }}
  header dl {{ display: flex; gap: 24px; margin: 0; font-size: 13px; }}
  header dt {{ font-weight: bold; }}
  header dd {{ margin: 0 0 0 4px; }}
  .matrix svg {{ max-width: 100%; height: auto; }}
  footer {{ display: flex; justify-content: space-between; border-top: 1px solid #e5e7eb;
           margin-top: 16px; padding-top: 6px; font-size: 11px; color: #6b7280; }}
</style>
</head>
<body>
<header>
  <h1>{title}</h1>
  <dl>
    <dt>Project:</dt><dd>{project}</dd>
    <dt>Tower:</dt><dd>{tower}</dd>
    <dt>Date:</dt><dd>{date}</dd>
  </dl>
</header>
<main class="matrix">
{svg}
</main>
<footer>
  <span>{project}</span>
  <span>Page 1 of 1</span>
</footer>
</body>
</html>
"#,
            title = REPORT_TITLE,
            project = project,
            tower = tower,
            date = date.format("%Y-%m-%d"),
            svg = svg,
        ))
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

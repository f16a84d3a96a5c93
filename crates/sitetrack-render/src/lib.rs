//! # sitetrack-render
//!
//! Rendering backends for sitetrack progress views.
//!
//! This crate provides:
//! - SVG progress matrix (floors × activities, colored by bucket)
//! - SVG real vs scheduled chart
//! - Plain-text tables for terminals
//! - Excel workbook of the matrix
//! - Single-page PDF report
//! - Report export (`ExportToolkit`) with file naming
//!
//! ## Example
//!
//! ```rust
//! use sitetrack_aggregate::{latest_cell_map, tower_matrix};
//! use sitetrack_core::{ProgressRecord, ProjectConfig, Renderer};
//! use sitetrack_render::{MatrixSvgRenderer, TextRenderer};
//!
//! let config = ProjectConfig::new("Residencial Norte").tower("A", 3).activity("Paint");
//! let records = vec![ProgressRecord::new("A", 1, "Paint", 100).at("2025-03-01")];
//! let matrix = tower_matrix(&config, &latest_cell_map(&records), "A", &config.activities);
//!
//! let svg = MatrixSvgRenderer::new().render(&config, &matrix).unwrap();
//! assert!(svg.contains("<svg"));
//!
//! let text = TextRenderer::new().render(&config, &matrix).unwrap();
//! assert!(text.contains("100%"));
//! ```

pub mod chart;
pub mod excel;
pub mod export;
pub mod matrix;
pub mod pdf;
pub mod text;

pub use chart::ChartSvgRenderer;
pub use excel::ExcelRenderer;
pub use export::{report_file_name, sanitize_file_part, ExportError, ExportFormat, ExportToolkit, ExportedReport};
pub use matrix::MatrixSvgRenderer;
pub use pdf::PdfRenderer;
pub use text::TextRenderer;

use sitetrack_core::RenderError;
use svg::Document;

/// Serialize an SVG document to a string
pub(crate) fn write_svg(document: &Document) -> Result<String, RenderError> {
    let mut output = Vec::new();
    svg::write(&mut output, document)
        .map_err(|e| RenderError::Format(format!("Failed to write SVG: {}", e)))?;

    String::from_utf8(output).map_err(|e| RenderError::Format(format!("Invalid UTF-8: {}", e)))
}

/// Truncate a label to `max` characters, adding an ellipsis
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

/// Cell label: "75%" or "-" when nothing was reported
pub(crate) fn percent_label(value: Option<u8>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{}%", v))
}

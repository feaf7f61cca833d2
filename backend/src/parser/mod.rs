//! Source table readers.
//!
//! Spreadsheets (xlsx, xlsm, xlsb, xls, ods) go through calamine and use cached
//! formula results. CSV files get encoding and delimiter auto-detection.
//!
//! Readers produce a [`SourceTable`]: every physical row from row 1, the header
//! included. Skipping the header is the filter's job.

pub mod csv;
pub mod workbook;

use serde::Serialize;
use std::path::Path;

use crate::error::{SourceError, SourceResult};
use crate::models::SourceRow;

pub use self::csv::{decode_content, detect_delimiter, detect_encoding, parse_csv_bytes, read_csv_file};
pub use self::workbook::{read_workbook, sheet_names};

/// Rows read from the source, with metadata.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceTable {
    /// Sheet the rows came from (file stem for CSV).
    pub sheet: String,
    /// All rows, header first.
    pub rows: Vec<SourceRow>,
    /// Widest row, in columns.
    pub width: usize,
    /// Detected encoding, for CSV sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Detected delimiter, for CSV sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
}

impl SourceTable {
    pub fn new(sheet: impl Into<String>, rows: Vec<SourceRow>) -> Self {
        let width = rows.iter().map(SourceRow::len).max().unwrap_or(0);
        Self {
            sheet: sheet.into(),
            rows,
            width,
            encoding: None,
            delimiter: None,
        }
    }

    /// Number of rows, header included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Fail if the table has fewer than `required` columns.
    ///
    /// An empty table passes: there is nothing to read past the header.
    pub fn ensure_width(&self, required: usize) -> SourceResult<()> {
        if !self.rows.is_empty() && self.width < required {
            return Err(SourceError::TooNarrow {
                required,
                actual: self.width,
            });
        }
        Ok(())
    }
}

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Workbook,
    Csv,
}

impl SourceFormat {
    /// Pick the reader from the file extension.
    pub fn from_path(path: &Path) -> SourceResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Workbook),
            "csv" | "txt" => Ok(SourceFormat::Csv),
            _ => Err(SourceError::UnsupportedFormat(ext)),
        }
    }
}

/// Read a source table from `path`.
///
/// `sheet` selects a workbook sheet by name; the first sheet is used when absent.
/// It is ignored for CSV sources.
pub fn read_source(path: &Path, sheet: Option<&str>) -> SourceResult<SourceTable> {
    match SourceFormat::from_path(path)? {
        SourceFormat::Workbook => read_workbook(path, sheet),
        SourceFormat::Csv => read_csv_file(path),
    }
}

//! Domain models shared by readers, the filter and the destination.
//!
//! - [`CellValue`] - a typed spreadsheet cell
//! - [`SourceRow`] - one row of the source table, addressed by zero-based position

use serde::{Deserialize, Serialize};

// =============================================================================
// Cell Values
// =============================================================================

/// A spreadsheet cell with type information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    #[default]
    Empty,
    String(String),
    Number(f64),
    Boolean(bool),
    /// Excel serial date (days since 1899-12-30, fraction is time of day).
    DateTime(f64),
    /// Error text as displayed, e.g. `#DIV/0!`.
    Error(String),
}

impl CellValue {
    /// Whether the cell holds nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Text rendering of the cell, as displayed.
    ///
    /// Integral numbers render without a fractional part so that `123.0` read by
    /// one reader and `"123"` read by another compare equal.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) | CellValue::Error(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::DateTime(serial) => {
                excel_serial_to_iso(*serial).unwrap_or_else(|| format_number(*serial))
            }
        }
    }

    /// [`CellValue::to_text`] with surrounding whitespace removed.
    pub fn to_trimmed_text(&self) -> String {
        self.to_text().trim().to_string()
    }

    /// Numeric value of the cell, if it has one.
    ///
    /// Numbers are used as-is; strings are trimmed and parsed. Empty cells, booleans,
    /// dates, errors, unparsable or non-finite text all return `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Format a number the way a spreadsheet shows it in a general-format cell.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// =============================================================================
// Excel Dates
// =============================================================================

fn excel_epoch() -> Option<chrono::NaiveDateTime> {
    chrono::NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Render an Excel serial date as ISO 8601, `None` when it is out of range.
pub fn excel_serial_to_iso(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let seconds = (serial * 86400.0).round() as i64;
    let offset = chrono::Duration::try_seconds(seconds)?;
    let datetime = excel_epoch()?.checked_add_signed(offset)?;
    Some(datetime.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Parse ISO 8601 date or date-time text into an Excel serial date.
pub fn iso_to_excel_serial(text: &str) -> Option<f64> {
    let text = text.trim();
    let datetime = chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    let elapsed = datetime.signed_duration_since(excel_epoch()?);
    Some(elapsed.num_milliseconds() as f64 / 86_400_000.0)
}

// =============================================================================
// Source Rows
// =============================================================================

/// One row of the source table.
///
/// Positions past the end of the row read as [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRow {
    pub cells: Vec<CellValue>,
}

impl SourceRow {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Cell at zero-based `position`.
    pub fn get(&self, position: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(position).unwrap_or(&EMPTY)
    }

    /// Trimmed text of the cell at `position`.
    pub fn text(&self, position: usize) -> String {
        self.get(position).to_trimmed_text()
    }

    /// Number of cells physically present.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }
}

impl From<Vec<CellValue>> for SourceRow {
    fn from(cells: Vec<CellValue>) -> Self {
        Self::new(cells)
    }
}

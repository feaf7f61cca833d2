//! Destination tables.
//!
//! The filter writes through the [`DestinationSheet`] trait so it can run
//! against an xlsx worksheet ([`DestinationWorkbook`]) or an in-memory
//! [`MemorySheet`]. Rows and columns are one-based, as in a spreadsheet.

pub mod workbook;

use std::collections::{BTreeMap, HashSet};

use crate::models::CellValue;

pub use workbook::{create_backup, DestinationWorkbook};

/// Cell-level access to a destination sheet.
pub trait DestinationSheet {
    /// Displayed text of a cell, untrimmed. Missing cells are `""`.
    fn read_text(&self, row: u32, col: u32) -> String;

    /// Overwrite a cell. `CellValue::Empty` clears it.
    fn write_cell(&mut self, row: u32, col: u32, value: &CellValue);

    /// Last row holding any cell, 0 for an empty sheet.
    fn last_used_row(&self) -> u32;

    /// Whether a cell holds nothing at all.
    fn is_blank_cell(&self, row: u32, col: u32) -> bool {
        self.read_text(row, col).is_empty()
    }
}

/// First row at or after `first_row` whose `col` cell is blank.
pub fn find_insertion_row<S: DestinationSheet + ?Sized>(sheet: &S, col: u32, first_row: u32) -> u32 {
    let mut row = first_row;
    while !sheet.is_blank_cell(row, col) {
        row += 1;
    }
    row
}

/// Trimmed, non-empty values of `col` from `first_row` to the last used row.
pub fn existing_part_numbers<S: DestinationSheet + ?Sized>(
    sheet: &S,
    col: u32,
    first_row: u32,
) -> HashSet<String> {
    (first_row..=sheet.last_used_row())
        .map(|row| sheet.read_text(row, col).trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Sparse in-memory sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySheet {
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed value of a cell.
    pub fn get(&self, row: u32, col: u32) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(&(row, col)).unwrap_or(&EMPTY)
    }
}

impl DestinationSheet for MemorySheet {
    fn read_text(&self, row: u32, col: u32) -> String {
        self.get(row, col).to_text()
    }

    fn write_cell(&mut self, row: u32, col: u32, value: &CellValue) {
        if value.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value.clone());
        }
    }

    fn last_used_row(&self) -> u32 {
        self.cells.keys().map(|(row, _)| *row).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_with_part_numbers(values: &[(u32, &str)]) -> MemorySheet {
        let mut sheet = MemorySheet::new();
        sheet.write_cell(1, 3, &"Part Number".into());
        for (row, value) in values {
            sheet.write_cell(*row, 3, &(*value).into());
        }
        sheet
    }

    #[test]
    fn test_insertion_row_on_header_only_sheet() {
        let sheet = sheet_with_part_numbers(&[]);
        assert_eq!(find_insertion_row(&sheet, 3, 2), 2);
    }

    #[test]
    fn test_insertion_row_after_filled_rows() {
        let sheet = sheet_with_part_numbers(&[(2, "A"), (3, "B")]);
        assert_eq!(find_insertion_row(&sheet, 3, 2), 4);
    }

    #[test]
    fn test_insertion_row_stops_at_first_hole() {
        let sheet = sheet_with_part_numbers(&[(2, "A"), (4, "C")]);
        assert_eq!(find_insertion_row(&sheet, 3, 2), 3);
    }

    #[test]
    fn test_whitespace_cell_is_not_blank() {
        let sheet = sheet_with_part_numbers(&[(2, "  ")]);
        assert_eq!(find_insertion_row(&sheet, 3, 2), 3);
        assert!(existing_part_numbers(&sheet, 3, 2).is_empty());
    }

    #[test]
    fn test_existing_part_numbers_skip_header_and_trim() {
        let sheet = sheet_with_part_numbers(&[(2, " PN001 "), (4, "PN003")]);
        let existing = existing_part_numbers(&sheet, 3, 2);
        assert_eq!(existing.len(), 2);
        assert!(existing.contains("PN001"));
        assert!(existing.contains("PN003"));
        assert!(!existing.contains("Part Number"));
    }

    #[test]
    fn test_numeric_part_numbers_render_as_integers() {
        let mut sheet = MemorySheet::new();
        sheet.write_cell(2, 3, &CellValue::Number(4711.0));
        assert!(existing_part_numbers(&sheet, 3, 2).contains("4711"));
    }

    #[test]
    fn test_setting_empty_clears() {
        let mut sheet = sheet_with_part_numbers(&[(2, "A")]);
        sheet.write_cell(2, 3, &CellValue::Empty);
        assert!(sheet.is_blank_cell(2, 3));
        assert_eq!(sheet.last_used_row(), 1);
    }
}

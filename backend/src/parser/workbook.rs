use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::path::Path;

use super::SourceTable;
use crate::error::{SourceError, SourceResult};
use crate::models::{iso_to_excel_serial, CellValue, SourceRow};

/// Read one sheet of a workbook, the first one when `sheet` is `None`.
///
/// Rows and columns are anchored at A1: leading empty rows and columns that
/// the used range leaves out are filled with empty cells, so positions match
/// what a spreadsheet user sees.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> SourceResult<SourceTable> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| SourceError::Workbook(format!("{}: {}", path.display(), e)))?;

    let names = workbook.sheet_names().to_vec();
    let target = match sheet {
        Some(name) => names
            .iter()
            .find(|n| n.as_str() == name)
            .cloned()
            .ok_or_else(|| SourceError::SheetNotFound(name.to_string()))?,
        None => names.first().cloned().ok_or(SourceError::NoSheets)?,
    };

    let range = workbook
        .worksheet_range(&target)
        .map_err(|e| SourceError::Workbook(format!("sheet '{}': {}", target, e)))?;

    Ok(SourceTable::new(target, range_to_rows(&range)))
}

/// Sheet names of a workbook, in workbook order.
pub fn sheet_names(path: &Path) -> SourceResult<Vec<String>> {
    let workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| SourceError::Workbook(format!("{}: {}", path.display(), e)))?;
    Ok(workbook.sheet_names().to_vec())
}

fn range_to_rows(range: &Range<Data>) -> Vec<SourceRow> {
    let Some((last_row, last_col)) = range.end() else {
        return Vec::new();
    };

    (0..=last_row)
        .map(|row| {
            let cells = (0..=last_col)
                .map(|col| convert_cell_value(range.get_value((row, col))))
                .collect();
            SourceRow::new(cells)
        })
        .collect()
}

/// Convert calamine Data to our CellValue
fn convert_cell_value(cell: Option<&Data>) -> CellValue {
    match cell {
        None => CellValue::Empty,
        Some(data) => match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) if s.is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::String(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
            Data::DateTimeIso(s) => iso_to_excel_serial(s)
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::String(s.clone())),
            Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_xlsx(path: &Path, cells: &[((u32, u32), &str)], numbers: &[((u32, u32), f64)]) {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        for ((col, row), value) in cells {
            sheet.get_cell_mut((*col, *row)).set_value(*value);
        }
        for ((col, row), value) in numbers {
            sheet.get_cell_mut((*col, *row)).set_value_number(*value);
        }
        umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
    }

    #[test]
    fn test_read_first_sheet_anchored_at_a1() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.xlsx");
        // Data starts at C2; column A and row 1 are empty.
        write_xlsx(&path, &[((3, 2), "PN001")], &[((4, 3), 500.0)]);

        let table = read_workbook(&path, None).unwrap();
        assert_eq!(table.sheet, "Sheet1");
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.width, 4);
        assert_eq!(table.rows[0].get(0), &CellValue::Empty);
        assert_eq!(table.rows[1].text(2), "PN001");
        assert_eq!(table.rows[2].get(3).as_number(), Some(500.0));
    }

    #[test]
    fn test_missing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.xlsx");
        write_xlsx(&path, &[((1, 1), "Category")], &[]);

        let err = read_workbook(&path, Some("Prices")).unwrap_err();
        assert!(matches!(err, SourceError::SheetNotFound(name) if name == "Prices"));
        assert_eq!(sheet_names(&path).unwrap(), vec!["Sheet1".to_string()]);
    }

    #[test]
    fn test_date_cells_keep_their_serial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.xlsx");
        write_xlsx(&path, &[((1, 1), "Category")], &[((2, 2), 1.0e9), ((3, 2), 45292.0)]);

        let mut book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        for coord in ["B2", "C2"] {
            sheet
                .get_style_mut(coord)
                .get_number_format_mut()
                .set_format_code(umya_spreadsheet::NumberingFormat::FORMAT_DATE_YYYYMMDD);
        }
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let table = read_workbook(&path, None).unwrap();
        assert_eq!(table.rows[1].get(1), &CellValue::DateTime(1.0e9));
        assert_eq!(table.rows[1].text(1), "1000000000");
        assert_eq!(table.rows[1].get(2), &CellValue::DateTime(45292.0));
        assert_eq!(table.rows[1].text(2), "2024-01-01T00:00:00");
    }

    #[test]
    fn test_convert_errors_and_iso_dates() {
        assert_eq!(
            convert_cell_value(Some(&Data::Error(calamine::CellErrorType::Div0))),
            CellValue::Error("#DIV/0!".to_string())
        );
        assert_eq!(
            convert_cell_value(Some(&Data::DateTimeIso("2024-01-01T12:00:00".into()))),
            CellValue::DateTime(45292.5)
        );
        assert_eq!(
            convert_cell_value(Some(&Data::DateTimeIso("T10:00:00".into()))),
            CellValue::from("T10:00:00")
        );
    }

    #[test]
    fn test_convert_int_and_empty_string() {
        assert_eq!(convert_cell_value(Some(&Data::Int(7))), CellValue::Number(7.0));
        assert_eq!(convert_cell_value(Some(&Data::String(String::new()))), CellValue::Empty);
        assert_eq!(convert_cell_value(None), CellValue::Empty);
    }
}

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use umya_spreadsheet::{reader, writer, Spreadsheet, Worksheet};

use super::DestinationSheet;
use crate::error::{DestinationError, DestinationResult, PersistenceError, PersistenceResult};
use crate::models::{format_number, CellValue};

/// An xlsx destination opened for modification.
///
/// The whole workbook is held in memory; the file on disk is only replaced by
/// [`DestinationWorkbook::save`].
pub struct DestinationWorkbook {
    path: PathBuf,
    book: Spreadsheet,
    sheet: String,
}

impl DestinationWorkbook {
    /// Open `path` and select `sheet`, or the first sheet when `None`.
    pub fn open(path: &Path, sheet: Option<&str>) -> DestinationResult<Self> {
        let book = reader::xlsx::read(path).map_err(|e| DestinationError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let names: Vec<String> = book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .collect();

        let selected = match sheet {
            Some(name) => names
                .into_iter()
                .find(|n| n == name)
                .ok_or_else(|| DestinationError::SheetNotFound(name.to_string()))?,
            None => names.into_iter().next().ok_or(DestinationError::NoSheets)?,
        };

        Ok(Self {
            path: path.to_path_buf(),
            book,
            sheet: selected,
        })
    }

    /// Name of the selected sheet.
    pub fn sheet_name(&self) -> &str {
        &self.sheet
    }

    /// The selected worksheet.
    pub fn worksheet(&self) -> DestinationResult<&Worksheet> {
        self.book
            .get_sheet_by_name(&self.sheet)
            .ok_or_else(|| DestinationError::SheetNotFound(self.sheet.clone()))
    }

    /// The selected worksheet, for writing.
    pub fn worksheet_mut(&mut self) -> DestinationResult<&mut Worksheet> {
        self.book
            .get_sheet_by_name_mut(&self.sheet)
            .ok_or_else(|| DestinationError::SheetNotFound(self.sheet.clone()))
    }

    /// Save back to the path the workbook was opened from.
    pub fn save(&self) -> PersistenceResult<()> {
        self.save_as(&self.path)
    }

    /// Save the workbook to `path`, replacing it atomically.
    ///
    /// The workbook is serialised in memory, written to a temporary file in the
    /// same directory and renamed over `path`. On any failure `path` keeps its
    /// previous content. A read-only destination is reported as locked.
    pub fn save_as(&self, path: &Path) -> PersistenceResult<()> {
        if let Ok(meta) = fs::metadata(path) {
            if meta.permissions().readonly() {
                let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "file is read-only");
                return Err(PersistenceError::from_io(path, err));
            }
        }

        let mut buffer = Cursor::new(Vec::new());
        writer::xlsx::write_writer(&self.book, &mut buffer)
            .map_err(|e| PersistenceError::Serialize(e.to_string()))?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| PersistenceError::from_io(path, e))?;
        tmp.write_all(buffer.get_ref())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| PersistenceError::from_io(path, e))?;

        if let Ok(meta) = fs::metadata(path) {
            let _ = fs::set_permissions(tmp.path(), meta.permissions());
        }

        tmp.persist(path)
            .map_err(|e| PersistenceError::from_io(path, e.error))?;
        Ok(())
    }
}

/// Copy `path` to `<path>.backup.<timestamp>` and return the backup path.
pub fn create_backup(path: &Path) -> PersistenceResult<PathBuf> {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".backup.{}", chrono::Local::now().format("%Y%m%d_%H%M%S")));
    let backup = PathBuf::from(name);

    fs::copy(path, &backup).map_err(|source| PersistenceError::Backup {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(backup)
}

/// Number formats applied to written dates.
const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

impl DestinationSheet for Worksheet {
    fn read_text(&self, row: u32, col: u32) -> String {
        self.get_cell((col, row))
            .map(|cell| cell.get_value().to_string())
            .unwrap_or_default()
    }

    fn write_cell(&mut self, row: u32, col: u32, value: &CellValue) {
        if value.is_empty() && self.get_cell((col, row)).is_none() {
            return;
        }

        let cell = self.get_cell_mut((col, row));
        match value {
            CellValue::Empty => {
                cell.set_value_string("");
            }
            CellValue::String(s) => {
                cell.set_value_string(s.as_str());
            }
            CellValue::DateTime(serial) if serial.is_finite() => {
                cell.set_value_number(*serial);
                let code = if serial.fract() == 0.0 { DATE_FORMAT } else { DATETIME_FORMAT };
                cell.get_style_mut().get_number_format_mut().set_format_code(code);
            }
            CellValue::DateTime(serial) => {
                cell.set_value_string(format_number(*serial));
            }
            CellValue::Number(n) if n.is_finite() => {
                cell.set_value_number(*n);
            }
            CellValue::Number(n) => {
                cell.set_value_string(format_number(*n));
            }
            CellValue::Boolean(b) => {
                cell.set_value_bool(*b);
            }
            CellValue::Error(e) => {
                cell.set_value_string(e.as_str());
            }
        }
    }

    fn last_used_row(&self) -> u32 {
        self.get_highest_row()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_destination(path: &Path, part_numbers: &[&str]) {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
        sheet.get_cell_mut("C1").set_value("Part Number");
        sheet.get_cell_mut("H1").set_value("Price");
        for (i, pn) in part_numbers.iter().enumerate() {
            sheet.get_cell_mut((3, i as u32 + 2)).set_value_string(*pn);
        }
        writer::xlsx::write(&book, path).unwrap();
    }

    #[test]
    fn test_open_and_read_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dest.xlsx");
        write_destination(&path, &["PN001", "PN002"]);

        let wb = DestinationWorkbook::open(&path, None).unwrap();
        assert_eq!(wb.sheet_name(), "Sheet1");
        let ws = wb.worksheet().unwrap();
        assert_eq!(ws.read_text(1, 3), "Part Number");
        assert_eq!(ws.read_text(3, 3), "PN002");
        assert_eq!(ws.read_text(4, 3), "");
        assert_eq!(ws.last_used_row(), 3);
    }

    #[test]
    fn test_open_missing_file() {
        let err = DestinationWorkbook::open(Path::new("/nonexistent/dest.xlsx"), None).err().unwrap();
        assert!(matches!(err, DestinationError::Read { .. }));
    }

    #[test]
    fn test_open_missing_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dest.xlsx");
        write_destination(&path, &[]);

        let err = DestinationWorkbook::open(&path, Some("Catalog")).err().unwrap();
        assert!(matches!(err, DestinationError::SheetNotFound(name) if name == "Catalog"));
    }

    #[test]
    fn test_typed_writes_survive_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dest.xlsx");
        write_destination(&path, &[]);

        let mut wb = DestinationWorkbook::open(&path, None).unwrap();
        {
            let ws = wb.worksheet_mut().unwrap();
            ws.write_cell(2, 3, &"00123".into());
            ws.write_cell(2, 8, &CellValue::Number(499.5));
        }
        wb.save().unwrap();

        let table = crate::parser::read_workbook(&path, None).unwrap();
        assert_eq!(table.rows[1].get(2), &CellValue::from("00123"));
        assert_eq!(table.rows[1].get(7), &CellValue::Number(499.5));
        assert_eq!(table.rows[0].text(7), "Price");
    }

    #[test]
    fn test_dates_and_errors_survive_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dest.xlsx");
        write_destination(&path, &[]);

        let mut wb = DestinationWorkbook::open(&path, None).unwrap();
        {
            let ws = wb.worksheet_mut().unwrap();
            ws.write_cell(2, 5, &CellValue::DateTime(45292.0));
            ws.write_cell(3, 5, &CellValue::DateTime(45292.5));
            ws.write_cell(4, 5, &CellValue::Error("#DIV/0!".into()));
        }
        wb.save().unwrap();

        let table = crate::parser::read_workbook(&path, None).unwrap();
        assert_eq!(table.rows[1].get(4), &CellValue::DateTime(45292.0));
        assert_eq!(table.rows[2].get(4), &CellValue::DateTime(45292.5));
        assert_eq!(table.rows[3].text(4), "#DIV/0!");
    }

    #[test]
    fn test_read_only_destination_is_locked_and_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dest.xlsx");
        write_destination(&path, &["PN001"]);
        let before = fs::read(&path).unwrap();

        let mut wb = DestinationWorkbook::open(&path, None).unwrap();
        wb.worksheet_mut().unwrap().write_cell(3, 3, &"PN002".into());

        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms).unwrap();

        let err = wb.save().unwrap_err();
        assert!(err.is_locked());
        assert_eq!(fs::read(&path).unwrap(), before);

        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(false);
        fs::set_permissions(&path, perms).unwrap();
    }

    #[test]
    fn test_save_into_missing_directory_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dest.xlsx");
        write_destination(&path, &[]);

        let wb = DestinationWorkbook::open(&path, None).unwrap();
        let err = wb.save_as(&dir.path().join("missing").join("out.xlsx")).unwrap_err();
        assert!(matches!(err, PersistenceError::Write { .. }));
    }

    #[test]
    fn test_backup_copies_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dest.xlsx");
        write_destination(&path, &["PN001"]);

        let backup = create_backup(&path).unwrap();
        assert!(backup.to_string_lossy().contains("dest.xlsx.backup."));
        assert_eq!(fs::read(&backup).unwrap(), fs::read(&path).unwrap());
    }
}

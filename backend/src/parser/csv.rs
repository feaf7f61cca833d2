//! CSV source reader with encoding and delimiter auto-detection.

use std::path::Path;

use super::SourceTable;
use crate::error::{SourceError, SourceResult};
use crate::models::{CellValue, SourceRow};

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the given encoding.
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        // Latin-1 is decoded as its windows-1252 superset.
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ';';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes into a source table.
///
/// Rows may have different lengths. Blank lines are dropped. Fields stay text;
/// numeric interpretation happens where a number is needed.
pub fn parse_csv_bytes(bytes: &[u8], name: &str) -> SourceResult<SourceTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| SourceError::Csv(format!("line {}: {}", idx + 1, e)))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let cells = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::String(field.to_string())
                }
            })
            .collect();
        rows.push(SourceRow::new(cells));
    }

    let mut table = SourceTable::new(name, rows);
    table.encoding = Some(encoding);
    table.delimiter = Some(delimiter);
    Ok(table)
}

/// Read and parse a CSV file.
pub fn read_csv_file(path: &Path) -> SourceResult<SourceTable> {
    let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("csv");
    parse_csv_bytes(&bytes, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicolon_rows() {
        let table = parse_csv_bytes(b"cat;x;pn\nLaptops;;PN001\n", "t").unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1].text(0), "Laptops");
        assert_eq!(table.rows[1].get(1), &CellValue::Empty);
        assert_eq!(table.rows[1].text(2), "PN001");
        assert_eq!(table.delimiter, Some(';'));
    }

    #[test]
    fn test_quoted_fields_keep_delimiters() {
        let table = parse_csv_bytes(b"a,b\n\"Laptops, 15in\",2\n", "t").unwrap();
        assert_eq!(table.rows[1].text(0), "Laptops, 15in");
        assert_eq!(table.delimiter, Some(','));
    }

    #[test]
    fn test_ragged_rows_and_blank_lines() {
        let table = parse_csv_bytes(b"a;b;c\n1;2\n\n;;\n4;5;6;7\n", "t").unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.width, 4);
        assert_eq!(table.rows[1].get(2), &CellValue::Empty);
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_detect_delimiter_pipe() {
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");

        // ½ and ¤ are not remapped to their ISO-8859-15 replacements
        assert_eq!(decode_content(&[0xBD, 0xA4], "iso-8859-1"), "½¤");
        assert_eq!(decode_content(&[0x80, 0xE9], "windows-1252"), "€é");
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let table = parse_csv_bytes(b"\xEF\xBB\xBFcat;pn\nLaptops;PN1\n", "t").unwrap();
        assert_eq!(table.rows[0].text(0), "cat");
    }

    #[test]
    fn test_read_csv_file_uses_stem_as_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supplier.csv");
        std::fs::write(&path, "a;b\n1;2\n").unwrap();

        let table = read_csv_file(&path).unwrap();
        assert_eq!(table.sheet, "supplier");
        assert_eq!(table.row_count(), 2);
    }
}

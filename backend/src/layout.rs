//! Column layout for the transfer.
//!
//! Source positions are zero-based (as in a row slice). Destination columns are
//! one-based, as spreadsheet columns are (C = 3, D = 4, ...).
//!
//! The constants below are the defaults; [`ColumnLayout`] carries the same
//! positions and can be loaded from a JSON file to remap columns.
//!
//! ```json
//! {
//!   "source": { "category": 0, "partNumber": 2, "price": 11, "transferValue": 18 },
//!   "destination": { "partNumber": 3, "partNumberCopy": 4, "transferValue": 5, "price": 8 },
//!   "headerRows": 1
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};

/// Source positions (zero-based).
pub mod source {
    /// Column A: product category.
    pub const CATEGORY: usize = 0;
    /// Column C: part number.
    pub const PART_NUMBER: usize = 2;
    /// Column L: price.
    pub const PRICE: usize = 11;
    /// Column S: value copied verbatim.
    pub const TRANSFER_VALUE: usize = 18;
}

/// Destination columns (one-based).
pub mod destination {
    /// Column C: part number, also used to find the insertion row and for dedup.
    pub const PART_NUMBER: u32 = 3;
    /// Column D: second copy of the part number.
    pub const PART_NUMBER_COPY: u32 = 4;
    /// Column E: value taken from source column S.
    pub const TRANSFER_VALUE: u32 = 5;
    /// Column H: price taken from source column L.
    pub const PRICE: u32 = 8;
    /// First data row; row 1 holds headers.
    pub const FIRST_DATA_ROW: u32 = 2;
}

/// Where fields are read from in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceColumns {
    pub category: usize,
    pub part_number: usize,
    pub price: usize,
    pub transfer_value: usize,
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self {
            category: source::CATEGORY,
            part_number: source::PART_NUMBER,
            price: source::PRICE,
            transfer_value: source::TRANSFER_VALUE,
        }
    }
}

/// Where fields are written in the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationColumns {
    pub part_number: u32,
    pub part_number_copy: u32,
    pub transfer_value: u32,
    pub price: u32,
}

impl Default for DestinationColumns {
    fn default() -> Self {
        Self {
            part_number: destination::PART_NUMBER,
            part_number_copy: destination::PART_NUMBER_COPY,
            transfer_value: destination::TRANSFER_VALUE,
            price: destination::PRICE,
        }
    }
}

/// Full mapping used by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnLayout {
    #[serde(default)]
    pub source: SourceColumns,
    #[serde(default)]
    pub destination: DestinationColumns,
    /// Header rows skipped at the top of the source and reserved in the destination.
    #[serde(default = "default_header_rows")]
    pub header_rows: u32,
}

fn default_header_rows() -> u32 {
    1
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            source: SourceColumns::default(),
            destination: DestinationColumns::default(),
            header_rows: default_header_rows(),
        }
    }
}

impl ColumnLayout {
    /// Parse from JSON.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let layout: ColumnLayout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load from a JSON file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::LayoutIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check that destination columns are usable and do not overwrite each other.
    ///
    /// The two Part Number columns may coincide; the transfer value and price
    /// columns must be distinct from everything else.
    pub fn validate(&self) -> ConfigResult<()> {
        let d = &self.destination;
        let named = [
            ("partNumber", d.part_number),
            ("partNumberCopy", d.part_number_copy),
            ("transferValue", d.transfer_value),
            ("price", d.price),
        ];
        if let Some((name, _)) = named.iter().find(|(_, col)| *col == 0) {
            return Err(ConfigError::InvalidLayout(format!(
                "destination column '{}' must be 1 or greater",
                name
            )));
        }

        for (i, (name_a, col_a)) in named.iter().enumerate() {
            for (name_b, col_b) in &named[i + 1..] {
                let both_part_numbers = *name_a == "partNumber" && *name_b == "partNumberCopy";
                if col_a == col_b && !both_part_numbers {
                    return Err(ConfigError::InvalidLayout(format!(
                        "destination columns '{}' and '{}' both map to column {}",
                        name_a, name_b, col_a
                    )));
                }
            }
        }
        Ok(())
    }

    /// Minimum number of source columns needed to read every field.
    pub fn source_width(&self) -> usize {
        let s = &self.source;
        [s.category, s.part_number, s.price, s.transfer_value]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }

    /// First destination row that may receive data.
    pub fn first_data_row(&self) -> u32 {
        self.header_rows + 1
    }
}

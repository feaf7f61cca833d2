//! Row transfer filter.
//!
//! One pass over the source rows. For each row after the header:
//!
//! 1. category must be in the allowed set
//! 2. part number must be non-empty
//! 3. part number must not already be in the destination
//! 4. price must be numeric and non-zero
//!
//! Rows that pass are appended to the destination: the part number goes to both
//! Part Number columns, the transfer value and price are copied verbatim.
//! Appends start at the first row whose Part Number cell is blank and continue
//! on consecutive rows.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::api::logs::{LogEntry, LogSink};
use crate::config::AllowedCategories;
use crate::destination::{existing_part_numbers, find_insertion_row, DestinationSheet};
use crate::layout::ColumnLayout;
use crate::models::{CellValue, SourceRow};

/// Why a row was not copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SkipReason {
    CategoryNotAllowed { category: String },
    MissingPartNumber,
    DuplicatePartNumber { part_number: String },
    NonNumericPrice { part_number: String },
    ZeroPrice { part_number: String },
}

impl SkipReason {
    /// Human-readable log line for this skip.
    pub fn message(&self) -> String {
        match self {
            SkipReason::CategoryNotAllowed { category } => {
                format!("Row skipped. Category '{}' not allowed.", category)
            }
            SkipReason::MissingPartNumber => "Row without Part Number, skipped.".to_string(),
            SkipReason::DuplicatePartNumber { part_number } => {
                format!("Skipping duplicate Part Number: {}", part_number)
            }
            SkipReason::NonNumericPrice { part_number } => {
                format!("Skipping item {}: non-numeric price.", part_number)
            }
            SkipReason::ZeroPrice { part_number } => {
                format!("Skipping item {}: price is 0.", part_number)
            }
        }
    }
}

/// What happened to one source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RowOutcome {
    /// Copied to destination `row`.
    Copied { part_number: String, row: u32 },
    Skipped(SkipReason),
}

/// Outcome of one source row, with its 1-based source row number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRecord {
    pub source_row: usize,
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

/// Skip tallies by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipCounts {
    pub category_not_allowed: usize,
    pub missing_part_number: usize,
    pub duplicate_part_number: usize,
    pub non_numeric_price: usize,
    pub zero_price: usize,
}

impl SkipCounts {
    fn record(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::CategoryNotAllowed { .. } => self.category_not_allowed += 1,
            SkipReason::MissingPartNumber => self.missing_part_number += 1,
            SkipReason::DuplicatePartNumber { .. } => self.duplicate_part_number += 1,
            SkipReason::NonNumericPrice { .. } => self.non_numeric_price += 1,
            SkipReason::ZeroPrice { .. } => self.zero_price += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.category_not_allowed
            + self.missing_part_number
            + self.duplicate_part_number
            + self.non_numeric_price
            + self.zero_price
    }
}

/// Result of a filter pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReport {
    /// Rows appended to the destination.
    pub copied: usize,
    pub skipped: SkipCounts,
    /// Destination row of the first append (where scanning found a blank Part Number).
    pub start_row: u32,
    /// Per-row outcomes, in source order.
    pub rows: Vec<RowRecord>,
}

impl TransferReport {
    /// Destination rows written, in order.
    pub fn written_rows(&self) -> Vec<u32> {
        self.rows
            .iter()
            .filter_map(|r| match r.outcome {
                RowOutcome::Copied { row, .. } => Some(row),
                RowOutcome::Skipped(_) => None,
            })
            .collect()
    }
}

/// Copy filtered rows from `rows` into `dest`.
///
/// `rows` is the whole source table; the first `layout.header_rows` rows are
/// skipped. The allowed set is only read.
pub fn transfer<S>(
    rows: &[SourceRow],
    dest: &mut S,
    allowed: &AllowedCategories,
    layout: &ColumnLayout,
    log: &dyn LogSink,
) -> TransferReport
where
    S: DestinationSheet + ?Sized,
{
    let dst = &layout.destination;
    let first_row = layout.first_data_row();

    let mut next_row = find_insertion_row(&*dest, dst.part_number, first_row);
    log.info(&format!("Starting copy at destination row {}.", next_row));

    let mut known: HashSet<String> = existing_part_numbers(&*dest, dst.part_number, first_row);

    let mut report = TransferReport {
        start_row: next_row,
        ..TransferReport::default()
    };

    for (idx, row) in rows.iter().enumerate().skip(layout.header_rows as usize) {
        let source_row = idx + 1;

        let outcome = match evaluate_row(row, allowed, &known, layout) {
            Err(reason) => {
                log.log(LogEntry::warning(reason.message()).with_indent(1));
                report.skipped.record(&reason);
                RowOutcome::Skipped(reason)
            }
            Ok(accepted) => {
                if !dest.is_blank_cell(next_row, dst.part_number) {
                    log.log(
                        LogEntry::warning(format!(
                            "Destination row {} already has a Part Number; overwriting it.",
                            next_row
                        ))
                        .with_indent(1),
                    );
                }

                let part_number = CellValue::String(accepted.part_number.clone());
                dest.write_cell(next_row, dst.part_number, &part_number);
                dest.write_cell(next_row, dst.part_number_copy, &part_number);
                dest.write_cell(next_row, dst.transfer_value, &accepted.transfer_value);
                dest.write_cell(next_row, dst.price, &accepted.price);

                log.log(
                    LogEntry::success(format!(
                        "Inserted Part Number {} at row {}.",
                        accepted.part_number, next_row
                    ))
                    .with_indent(1),
                );

                let outcome = RowOutcome::Copied {
                    part_number: accepted.part_number.clone(),
                    row: next_row,
                };
                known.insert(accepted.part_number);
                next_row += 1;
                report.copied += 1;
                outcome
            }
        };

        report.rows.push(RowRecord { source_row, outcome });
    }

    report
}

/// A row that passed every check.
struct AcceptedRow {
    part_number: String,
    price: CellValue,
    transfer_value: CellValue,
}

fn evaluate_row(
    row: &SourceRow,
    allowed: &AllowedCategories,
    known: &HashSet<String>,
    layout: &ColumnLayout,
) -> Result<AcceptedRow, SkipReason> {
    let src = &layout.source;

    let category = row.text(src.category);
    if !allowed.contains(&category) {
        return Err(SkipReason::CategoryNotAllowed { category });
    }

    let part_number = row.text(src.part_number);
    if part_number.is_empty() {
        return Err(SkipReason::MissingPartNumber);
    }

    if known.contains(&part_number) {
        return Err(SkipReason::DuplicatePartNumber { part_number });
    }

    let price = row.get(src.price);
    match price.as_number() {
        None => return Err(SkipReason::NonNumericPrice { part_number }),
        Some(p) if p == 0.0 => return Err(SkipReason::ZeroPrice { part_number }),
        Some(_) => {}
    }

    Ok(AcceptedRow {
        part_number,
        price: price.clone(),
        transfer_value: row.get(src.transfer_value).clone(),
    })
}

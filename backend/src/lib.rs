//! # Catalog Transfer - filtered row copy between spreadsheets
//!
//! Copies product rows from a supplier sheet into a catalog workbook, keeping
//! only allowed categories and priced items, skipping part numbers the catalog
//! already lists, and remapping columns.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Source    │────▶│   Parser    │────▶│   Filter    │────▶│ Destination │
//! │ (xlsx/csv)  │     │  (any fmt)  │     │ (cat/price) │     │   (xlsx)    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use catalog_transfer::{run_transfer, AllowedCategories, TransferSession};
//!
//! fn main() {
//!     let session = TransferSession::new(AllowedCategories::from_env())
//!         .with_source("supplier.xlsx")
//!         .with_destination("catalog.xlsx");
//!     let summary = run_transfer(&session).unwrap();
//!     println!("Copied {} rows", summary.report.copied);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per stage
//! - [`models`] - Cell values and source rows
//! - [`config`] - Allowed categories from the environment
//! - [`layout`] - Column mapping
//! - [`parser`] - Source reading (workbooks and CSV)
//! - [`destination`] - Destination sheet access and atomic save
//! - [`transfer`] - Row filter and session runner
//! - [`api`] - HTTP API server and transfer log

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;
pub mod layout;

// Reading
pub mod parser;

// Writing
pub mod destination;

// Transfer
pub mod transfer;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    DestinationError,
    PersistenceError,
    SourceError,
    TransferError,
    TransferResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CellValue, SourceRow};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{AllowedCategories, CATEGORY_ENV_VAR};
pub use layout::{ColumnLayout, DestinationColumns, SourceColumns};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    read_source,
    read_workbook,
    read_csv_file,
    sheet_names,
    detect_encoding,
    detect_delimiter,
    decode_content,
    SourceFormat,
    SourceTable,
};

// =============================================================================
// Re-exports - Destination
// =============================================================================

pub use destination::{
    create_backup,
    existing_part_numbers,
    find_insertion_row,
    DestinationSheet,
    DestinationWorkbook,
    MemorySheet,
};

// =============================================================================
// Re-exports - Transfer
// =============================================================================

pub use transfer::{
    run_transfer,
    transfer,
    RowOutcome,
    RowRecord,
    SkipCounts,
    SkipReason,
    TransferOptions,
    TransferReport,
    TransferSession,
    TransferSummary,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::logs::{LogEntry, LogLevel, LogSink, MemoryLog, LOG_BROADCASTER};
pub use api::types::{error_response, TransferRequest, TransferResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}

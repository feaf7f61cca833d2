//! Session-level transfer: open both files, run the filter, save.
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_transfer::{run_transfer, AllowedCategories, TransferSession};
//!
//! let session = TransferSession::new(AllowedCategories::from_env())
//!     .with_source("supplier.xlsx")
//!     .with_destination("catalog.xlsx");
//!
//! let summary = run_transfer(&session)?;
//! println!("Rows copied: {}", summary.report.copied);
//! ```
//!
//! Fatal errors abort the run. The destination file is written once, at the
//! end, and only if every earlier step succeeded.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::filter::{transfer, TransferReport};
use crate::api::logs::{LogSink, LOG_BROADCASTER};
use crate::config::AllowedCategories;
use crate::destination::{create_backup, DestinationWorkbook};
use crate::error::{ConfigError, TransferResult};
use crate::layout::ColumnLayout;
use crate::parser::read_source;

/// Options that change what happens at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOptions {
    /// Run the filter but do not save the destination.
    pub dry_run: bool,
    /// Copy the destination aside before saving.
    pub backup: bool,
}

/// Everything one transfer needs.
///
/// Each run opens fresh source and destination state; a session holds no file
/// handles between runs.
#[derive(Clone)]
pub struct TransferSession {
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    pub source_sheet: Option<String>,
    pub destination_sheet: Option<String>,
    pub layout: ColumnLayout,
    pub categories: AllowedCategories,
    pub options: TransferOptions,
    pub log: Arc<dyn LogSink>,
}

impl TransferSession {
    /// A session with no files selected, the default layout, logging to the
    /// global broadcaster.
    pub fn new(categories: AllowedCategories) -> Self {
        Self {
            source: None,
            destination: None,
            source_sheet: None,
            destination_sheet: None,
            layout: ColumnLayout::default(),
            categories,
            options: TransferOptions::default(),
            log: LOG_BROADCASTER.clone(),
        }
    }

    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    pub fn with_destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Some(path.into());
        self
    }

    pub fn with_source_sheet(mut self, sheet: Option<String>) -> Self {
        self.source_sheet = sheet;
        self
    }

    pub fn with_destination_sheet(mut self, sheet: Option<String>) -> Self {
        self.destination_sheet = sheet;
        self
    }

    pub fn with_layout(mut self, layout: ColumnLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_options(mut self, options: TransferOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_log(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Both selected paths, or the configuration error naming what is missing.
    pub fn selected_paths(&self) -> Result<(&Path, &Path), ConfigError> {
        match (&self.source, &self.destination) {
            (Some(src), Some(dst)) => Ok((src.as_path(), dst.as_path())),
            (None, Some(_)) => Err(ConfigError::MissingSource),
            (Some(_), None) => Err(ConfigError::MissingDestination),
            (None, None) => Err(ConfigError::MissingBoth),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSummary {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub source_sheet: String,
    pub destination_sheet: String,
    /// Source rows read, header included.
    pub source_rows: usize,
    pub allowed_categories: Vec<String>,
    /// Whether the destination file was written.
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    pub report: TransferReport,
}

/// Run a transfer.
///
/// Configuration and read errors are raised before anything is written. A
/// save error means the computed rows were discarded and the destination file
/// is unchanged.
pub fn run_transfer(session: &TransferSession) -> TransferResult<TransferSummary> {
    let log = session.log.as_ref();

    let result = run_steps(session, log);
    if let Err(ref e) = result {
        log.error(&e.to_string());
    }
    result
}

fn run_steps(session: &TransferSession, log: &dyn LogSink) -> TransferResult<TransferSummary> {
    let (source_path, destination_path) = session.selected_paths()?;
    session.layout.validate()?;

    if session.categories.is_empty() {
        log.warning("No allowed categories configured; every row will be skipped.");
    } else {
        log.info(&format!("Allowed categories: {}", session.categories));
    }

    log.info(&format!("Opening source file {}...", source_path.display()));
    let source = read_source(source_path, session.source_sheet.as_deref())?;
    source.ensure_width(session.layout.source_width())?;
    log.success(&format!(
        "Read {} rows from sheet '{}'",
        source.row_count(),
        source.sheet
    ));

    log.info(&format!("Opening destination file {}...", destination_path.display()));
    let mut workbook = DestinationWorkbook::open(destination_path, session.destination_sheet.as_deref())?;

    let report = {
        let sheet = workbook.worksheet_mut()?;
        transfer(&source.rows, sheet, &session.categories, &session.layout, log)
    };

    let mut backup = None;
    let saved = if session.options.dry_run {
        log.info("Dry run: destination not saved.");
        false
    } else {
        if session.options.backup {
            let path = create_backup(destination_path)?;
            log.info(&format!("Backup written to {}", path.display()));
            backup = Some(path);
        }
        workbook.save()?;
        true
    };

    log.success(&format!("Operation completed. Rows copied: {}.", report.copied));

    let source_rows = source.row_count();
    Ok(TransferSummary {
        source: source_path.to_path_buf(),
        destination: destination_path.to_path_buf(),
        source_sheet: source.sheet,
        destination_sheet: workbook.sheet_name().to_string(),
        source_rows,
        allowed_categories: session.categories.to_vec(),
        saved,
        backup,
        report,
    })
}

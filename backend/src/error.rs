//! Error types for the catalog transfer.
//!
//! Fatal failures are split by the stage that raised them:
//!
//! - [`ConfigError`] - missing selections, bad layout files, bad category lists
//! - [`SourceError`] - the source table cannot be opened or parsed
//! - [`DestinationError`] - the destination workbook cannot be opened
//! - [`PersistenceError`] - the destination workbook cannot be saved
//! - [`TransferError`] - top-level error returned by the session runner
//!
//! Per-row skips are not errors; see [`crate::transfer::SkipReason`].

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors detected before any file is opened.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No source file was selected.
    #[error("No source file selected")]
    MissingSource,

    /// No destination file was selected.
    #[error("No destination file selected")]
    MissingDestination,

    /// Neither file was selected.
    #[error("Select both files: source and destination")]
    MissingBoth,

    /// Layout file could not be read.
    #[error("Failed to read layout file '{path}': {source}")]
    LayoutIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Layout JSON is malformed.
    #[error("Invalid layout JSON: {0}")]
    LayoutJson(#[from] serde_json::Error),

    /// Layout maps columns inconsistently.
    #[error("Invalid column layout: {0}")]
    InvalidLayout(String),
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while reading the source table.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File could not be read from disk.
    #[error("Failed to read source file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Workbook could not be opened.
    #[error("Failed to open source workbook: {0}")]
    Workbook(String),

    /// CSV content is malformed.
    #[error("Invalid CSV content: {0}")]
    Csv(String),

    /// Extension is not a supported tabular format.
    #[error("Unsupported source format: '{0}'")]
    UnsupportedFormat(String),

    /// Requested sheet is missing.
    #[error("Sheet '{0}' not found in source workbook")]
    SheetNotFound(String),

    /// Workbook has no sheets at all.
    #[error("Source workbook has no sheets")]
    NoSheets,

    /// Table is narrower than the column layout requires.
    #[error("Source table has {actual} columns, layout needs at least {required}")]
    TooNarrow { required: usize, actual: usize },
}

// =============================================================================
// Destination Errors
// =============================================================================

/// Errors while opening the destination workbook.
#[derive(Debug, Error)]
pub enum DestinationError {
    /// Workbook could not be opened or parsed.
    #[error("Failed to open destination workbook '{path}': {message}")]
    Read { path: PathBuf, message: String },

    /// Requested sheet is missing.
    #[error("Sheet '{0}' not found in destination workbook")]
    SheetNotFound(String),

    /// Workbook has no sheets at all.
    #[error("Destination workbook has no sheets")]
    NoSheets,
}

// =============================================================================
// Persistence Errors
// =============================================================================

/// Errors while saving the destination workbook.
///
/// Nothing reaches the destination path unless the save succeeds as a whole.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Destination is locked or not writable (typically open in another program).
    #[error("Permission error saving '{path}': {source}. Close the destination file and try again")]
    Locked {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Workbook could not be serialised.
    #[error("Failed to serialise destination workbook: {0}")]
    Serialize(String),

    /// Any other write failure.
    #[error("Failed to save destination file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backup copy could not be created.
    #[error("Failed to back up '{path}': {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistenceError {
    /// Classify an I/O failure on `path` into a locked or generic write error.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if is_permission_error(&source) {
            PersistenceError::Locked { path, source }
        } else {
            PersistenceError::Write { path, source }
        }
    }

    /// Whether this is a permission-type failure.
    pub fn is_locked(&self) -> bool {
        matches!(self, PersistenceError::Locked { .. })
    }
}

/// Permission denied, or a Windows sharing/lock violation (ERROR_SHARING_VIOLATION = 32,
/// ERROR_LOCK_VIOLATION = 33).
fn is_permission_error(err: &std::io::Error) -> bool {
    if err.kind() == std::io::ErrorKind::PermissionDenied {
        return true;
    }
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

// =============================================================================
// Transfer Errors (top-level)
// =============================================================================

/// Top-level error returned by [`crate::transfer::run_transfer`].
#[derive(Debug, Error)]
pub enum TransferError {
    /// Configuration error, raised before any file is opened.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Source could not be read; nothing was modified.
    #[error("Source error: {0}")]
    SourceRead(#[from] SourceError),

    /// Destination could not be opened; nothing was modified.
    #[error("Destination error: {0}")]
    DestinationRead(#[from] DestinationError),

    /// Destination could not be saved; computed rows were discarded.
    #[error("Save error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl TransferError {
    /// Stable machine-readable identifier for the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::Configuration(_) => "configuration",
            TransferError::SourceRead(_) => "source_read",
            TransferError::DestinationRead(_) => "destination_read",
            TransferError::Persistence(e) if e.is_locked() => "persistence_locked",
            TransferError::Persistence(_) => "persistence",
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for source reading.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for destination opening.
pub type DestinationResult<T> = Result<T, DestinationError>;

/// Result type for saving.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Result type for a whole transfer.
pub type TransferResult<T> = Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion_chain() {
        let err: TransferError = SourceError::NoSheets.into();
        assert_eq!(err.kind(), "source_read");
        assert!(err.to_string().contains("no sheets"));

        let err: TransferError = ConfigError::MissingBoth.into();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn test_permission_denied_is_locked() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "in use");
        let err = PersistenceError::from_io("dest.xlsx", io_err);
        assert!(err.is_locked());
        assert!(err.to_string().contains("Close the destination file"));

        let transfer: TransferError = err.into();
        assert_eq!(transfer.kind(), "persistence_locked");
    }

    #[test]
    fn test_other_io_error_is_generic_write() {
        let io_err = io::Error::new(io::ErrorKind::Other, "disk full");
        let err = PersistenceError::from_io("dest.xlsx", io_err);
        assert!(!err.is_locked());

        let transfer: TransferError = err.into();
        assert_eq!(transfer.kind(), "persistence");
        assert!(transfer.to_string().contains("disk full"));
    }

    #[test]
    fn test_too_narrow_message() {
        let err = SourceError::TooNarrow { required: 19, actual: 12 };
        let msg = err.to_string();
        assert!(msg.contains("12 columns"));
        assert!(msg.contains("at least 19"));
    }
}

//! REST API types.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;

use super::logs::LogEntry;
use crate::error::TransferError;
use crate::transfer::{TransferOptions, TransferSummary};

/// Body of `POST /api/transfer`. Paths are resolved on the server host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    #[serde(default)]
    pub source_sheet: Option<String>,
    #[serde(default)]
    pub destination_sheet: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub backup: bool,
}

impl TransferRequest {
    pub fn options(&self) -> TransferOptions {
        TransferOptions {
            dry_run: self.dry_run,
            backup: self.backup,
        }
    }
}

/// Response sent after a completed transfer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    /// "ok", or "warning" when nothing was copied
    pub status: String,
    pub summary: TransferSummary,
    /// Log entries of this run, in order
    pub log: Vec<LogEntry>,
}

impl TransferResponse {
    pub fn new(summary: TransferSummary, log: Vec<LogEntry>) -> Self {
        let status = if summary.report.copied == 0 { "warning" } else { "ok" };
        Self {
            status: status.to_string(),
            summary,
            log,
        }
    }
}

/// HTTP status for a failed transfer.
pub fn status_for(err: &TransferError) -> StatusCode {
    match err.kind() {
        "configuration" => StatusCode::BAD_REQUEST,
        "source_read" | "destination_read" => StatusCode::UNPROCESSABLE_ENTITY,
        "persistence_locked" => StatusCode::LOCKED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Create an error response
pub fn error_response(kind: &str, error: &str, log: Vec<LogEntry>) -> Value {
    json!({
        "status": "error",
        "kind": kind,
        "error": error,
        "log": log,
    })
}

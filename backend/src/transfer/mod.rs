//! Row transfer.
//!
//! - [`filter`]: per-row rules and destination writes
//! - [`pipeline`]: opening files, running the filter, saving

pub mod filter;
pub mod pipeline;

pub use filter::{transfer, RowOutcome, RowRecord, SkipCounts, SkipReason, TransferReport};
pub use pipeline::{run_transfer, TransferOptions, TransferSession, TransferSummary};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the record store and the ledger operations built on it.
///
/// Every variant is local to one operation: when one is returned the
/// persisted document has not been touched.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Timesheet not found at {}. Run `timecard init` first.", .0.display())]
    NotFound(PathBuf),

    #[error("Timesheet is malformed: {0}")]
    Structural(String),

    #[error("An entry is already running (row {0}). Stop it first.")]
    OngoingConflict(usize),

    #[error("No entry is currently running.")]
    NoOngoingEntry,

    #[error("Row {index} is out of range ({len} rows)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Cannot merge row {index}: {reason}")]
    NotMergeable { index: usize, reason: String },

    #[error("Entry out of chronological order: {0}")]
    OrderViolation(String),

    #[error("Running entry started on {0}, more than one midnight ago")]
    SpansMultipleDays(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LedgerError {
    /// Internal errors point at a broken document or file system rather than
    /// at something the user asked for.
    pub fn is_internal(&self) -> bool {
        matches!(self, LedgerError::Structural(_) | LedgerError::Io { .. })
    }

    pub(crate) fn structural(message: impl Into<String>) -> Self {
        LedgerError::Structural(message.into())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        LedgerError::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

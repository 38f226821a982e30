//! Error types shared by the ledger, the scanner and the exporter.
//!
//! Every failure here is recoverable: the command loop prints the message
//! and waits for the next command.

use thiserror::Error;

/// Errors surfaced to the user by ledger and report operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Receipt with ID {0} not found")]
    ReceiptNotFound(String),

    #[error("Category with ID {0} not found")]
    CategoryNotFound(String),

    /// Export was requested while the ledger holds no receipts.
    #[error("No data to export")]
    NothingToExport,

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Input validation failures for receipts and categories.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    #[error("{field} must not be negative")]
    Negative { field: String },
}

/// Mock recognition failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("A receipt is already being recognized, wait for it to finish")]
    InProgress,
}

pub type TrackerResult<T> = Result<T, TrackerError>;

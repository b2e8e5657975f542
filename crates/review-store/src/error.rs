//! Error types for the review-store crate.
//!
//! Every store operation and every seed-file parse returns [`StoreError`].
//! Callers higher up decide whether a given failure is fatal (primary write,
//! reconciliation fetch) or recoverable (legacy replication).

use thiserror::Error;

/// Errors that can occur while reading or writing review data
#[derive(Error, Debug)]
pub enum StoreError {
    /// Seed file could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing a seed file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in a seed file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A field had a value outside its domain (e.g. stars = 9)
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// No review with this id exists in the store
    #[error("Review {0} not found")]
    ReviewNotFound(String),

    /// A row with this id is already stored
    #[error("Review {0} already exists")]
    DuplicateId(String),

    /// The backing store could not be reached
    #[error("{store} store unavailable: {reason}")]
    Unavailable { store: &'static str, reason: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, StoreError>;

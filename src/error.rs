//! Error types for epiwatch.

use thiserror::Error;

/// Errors produced by loading, filtering, querying and replaying a dataset.
#[derive(Debug, Error)]
pub enum EpiError {
    /// A configuration value is out of range (for example a zero chunk size).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The input file lacks a column every dataset must carry.
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),

    /// A cell could not be parsed into the type of its column.
    #[error("Row {row}: invalid value '{value}' in column '{column}': {reason}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
        reason: String,
    },

    /// Caller-supplied input that is not valid for the operation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The delimited reader failed (malformed quoting, ragged rows, I/O).
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// The embedded query engine rejected a statement. The message is the
    /// engine's own, untouched.
    #[error(transparent)]
    Query(#[from] rusqlite::Error),

    /// A statement passed to the query interface would modify the database.
    #[error("Only read-only statements may be run against the query store: {0}")]
    ReadOnly(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EpiError>;

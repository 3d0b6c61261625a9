//! Error types for the data-loader crate.
//!
//! Every malformed row is rejected here, at ingestion, so the rest of the
//! workspace only ever sees fully typed `Rating` and `Movie` values.

use thiserror::Error;

/// Errors that can occur while reading and parsing the CSV datasets
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// I/O error occurred while reading file
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Line in data file couldn't be parsed
    ///
    /// This variant stores context about where the error occurred
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// The header row does not name a required column
    #[error("Missing column '{column}' in header of {file}")]
    MissingColumn { file: String, column: String },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;

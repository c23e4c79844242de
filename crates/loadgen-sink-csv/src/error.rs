//! Error types for the CSV sink.

use loadgen_core::SinkError;
use thiserror::Error;

/// Errors that can occur while writing load files.
#[derive(Error, Debug)]
pub enum CsvSinkError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The delimiter must be a single ASCII character.
    #[error("Delimiter '{0}' is not a single ASCII character")]
    InvalidDelimiter(char),
}

impl From<CsvSinkError> for SinkError {
    fn from(err: CsvSinkError) -> Self {
        match err {
            CsvSinkError::Io(e) => SinkError::Io(e),
            other => SinkError::Encode {
                format: "csv",
                message: other.to_string(),
            },
        }
    }
}

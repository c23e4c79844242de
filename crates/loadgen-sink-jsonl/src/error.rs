//! Error types for the JSONL sink.

use loadgen_core::SinkError;
use thiserror::Error;

/// Errors that can occur while writing JSON lines.
#[derive(Error, Debug)]
pub enum JsonlSinkError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<JsonlSinkError> for SinkError {
    fn from(err: JsonlSinkError) -> Self {
        match err {
            JsonlSinkError::Io(e) => SinkError::Io(e),
            JsonlSinkError::Json(e) => SinkError::Encode {
                format: "jsonl",
                message: e.to_string(),
            },
        }
    }
}

//! The output sink interface.

use crate::row::{ArticleRow, CommentRow};
use crate::PartitionId;
use thiserror::Error;

/// Errors raised by output sinks.
#[derive(Error, Debug)]
pub enum SinkError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding error raised by the output format.
    #[error("{format} encoding error: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    /// Row emitted before `init` or after `close`.
    #[error("Sink '{0}' is not open")]
    NotOpen(&'static str),
}

/// Destination for finished rows.
///
/// One instance serves exactly one partition. Every row for that partition
/// reaches every registered sink.
pub trait OutputSink: Send {
    /// Logical name, as used in the run configuration.
    fn name(&self) -> &'static str;

    /// Open the sink for `partition`. `prefix` is the path prefix of any
    /// files the sink creates.
    fn init(&mut self, prefix: &str, partition: PartitionId) -> Result<(), SinkError>;

    fn emit_article(&mut self, row: &ArticleRow) -> Result<(), SinkError>;

    fn emit_comment(&mut self, row: &CommentRow) -> Result<(), SinkError>;

    /// Flush and release resources. Called once at the end of a run.
    fn close(&mut self) -> Result<(), SinkError>;
}

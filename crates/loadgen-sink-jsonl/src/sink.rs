//! JSONL output sink.

use crate::error::JsonlSinkError;
use crate::value::record_to_json;
use loadgen_core::{
    ArticleRow, CommentRow, OutputSink, PartitionId, Record, RowKind, SinkError,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

/// Default buffer size for JSONL writing.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

struct JsonlFile {
    path: PathBuf,
    writer: BufWriter<File>,
    rows_written: u64,
}

impl JsonlFile {
    fn create(path: PathBuf) -> Result<Self, JsonlSinkError> {
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file),
            rows_written: 0,
        })
    }

    fn write<R: Record>(&mut self, row: &R) -> Result<(), JsonlSinkError> {
        serde_json::to_writer(&mut self.writer, &record_to_json(row))?;
        writeln!(self.writer)?;
        self.rows_written += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<(), JsonlSinkError> {
        self.writer.flush()?;
        drop(self.writer);

        let file_size_bytes = std::fs::metadata(&self.path)?.len();
        info!(
            "JSONL file '{}' complete: {} rows, {} bytes",
            self.path.display(),
            self.rows_written,
            file_size_bytes
        );
        Ok(())
    }
}

/// Writes `{prefix}_article_{p}.jsonl` and `{prefix}_comment_{p}.jsonl`.
#[derive(Default)]
pub struct JsonlSink {
    articles: Option<JsonlFile>,
    comments: Option<JsonlFile>,
}

impl JsonlSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the file a row kind is written to.
    pub fn file_path(prefix: &str, kind: RowKind, partition: PartitionId) -> PathBuf {
        PathBuf::from(format!("{prefix}_{kind}_{partition}.jsonl"))
    }
}

impl OutputSink for JsonlSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn init(&mut self, prefix: &str, partition: PartitionId) -> Result<(), SinkError> {
        let articles = JsonlFile::create(Self::file_path(prefix, RowKind::Article, partition))?;
        let comments = JsonlFile::create(Self::file_path(prefix, RowKind::Comment, partition))?;
        info!(
            "Writing JSONL for partition {} to '{}' and '{}'",
            partition,
            articles.path.display(),
            comments.path.display()
        );
        self.articles = Some(articles);
        self.comments = Some(comments);
        Ok(())
    }

    fn emit_article(&mut self, row: &ArticleRow) -> Result<(), SinkError> {
        let file = self.articles.as_mut().ok_or(SinkError::NotOpen("jsonl"))?;
        Ok(file.write(row)?)
    }

    fn emit_comment(&mut self, row: &CommentRow) -> Result<(), SinkError> {
        let file = self.comments.as_mut().ok_or(SinkError::NotOpen("jsonl"))?;
        Ok(file.write(row)?)
    }

    fn close(&mut self) -> Result<(), SinkError> {
        let mut first_error = None;
        for file in [self.articles.take(), self.comments.take()].into_iter().flatten() {
            if let Err(e) = file.finish() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), |e| Err(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn comment(comment_no: i64) -> CommentRow {
        CommentRow {
            service_id: 21,
            ticket_no: 9,
            object_id: "1-8".to_string(),
            comment_no,
            top_comment_no: 1,
            parent_comment_no: 1,
            depth: 1,
            position: 0,
            sort_key: "00000000000000000000".to_string(),
            reg_time: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_one_object_per_line() {
        let temp_dir = TempDir::new().unwrap();
        let prefix = temp_dir.path().join("run").to_string_lossy().into_owned();
        let mut sink = JsonlSink::new();

        sink.init(&prefix, 1).unwrap();
        for n in 2..5 {
            sink.emit_comment(&comment(n)).unwrap();
        }
        sink.close().unwrap();

        let content =
            std::fs::read_to_string(JsonlSink::file_path(&prefix, RowKind::Comment, 1)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["comment_no"], 2);
        assert_eq!(first["sort_key"], "00000000000000000000");
        assert_eq!(first["reg_time"], "2024-06-01T12:00:00+00:00");

        let articles =
            std::fs::read_to_string(JsonlSink::file_path(&prefix, RowKind::Article, 1)).unwrap();
        assert!(articles.is_empty());
    }

    #[test]
    fn test_failed_article_file_still_flushes_comments() {
        let temp_dir = TempDir::new().unwrap();
        let prefix = temp_dir.path().join("run").to_string_lossy().into_owned();
        let mut sink = JsonlSink::new();

        sink.init(&prefix, 4).unwrap();
        sink.emit_comment(&comment(7)).unwrap();
        std::fs::remove_file(JsonlSink::file_path(&prefix, RowKind::Article, 4)).unwrap();

        assert!(matches!(sink.close(), Err(SinkError::Io(_))));
        let content =
            std::fs::read_to_string(JsonlSink::file_path(&prefix, RowKind::Comment, 4)).unwrap();
        let row: serde_json::Value = serde_json::from_str(content.trim_end()).unwrap();
        assert_eq!(row["comment_no"], 7);
    }

    #[test]
    fn test_emit_after_close_fails() {
        let temp_dir = TempDir::new().unwrap();
        let prefix = temp_dir.path().join("run").to_string_lossy().into_owned();
        let mut sink = JsonlSink::new();

        sink.init(&prefix, 0).unwrap();
        sink.close().unwrap();
        assert!(matches!(
            sink.emit_comment(&comment(1)),
            Err(SinkError::NotOpen("jsonl"))
        ));
    }
}

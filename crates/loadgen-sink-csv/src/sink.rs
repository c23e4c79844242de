//! CSV output sink.

use crate::error::CsvSinkError;
use crate::value::fields_to_record;
use csv::{Writer, WriterBuilder};
use loadgen_core::{
    ArticleRow, CommentRow, OutputSink, PartitionId, Record, RowKind, SinkError,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{debug, info};

/// Default buffer size for CSV writing.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Formatting options for one CSV sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    delimiter: u8,
    header: bool,
    null_token: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            header: true,
            null_token: String::new(),
        }
    }
}

impl CsvOptions {
    /// Create options; the delimiter must be a single ASCII character.
    pub fn new(
        delimiter: char,
        header: bool,
        null_token: impl Into<String>,
    ) -> Result<Self, CsvSinkError> {
        if !delimiter.is_ascii() {
            return Err(CsvSinkError::InvalidDelimiter(delimiter));
        }
        Ok(Self {
            delimiter: delimiter as u8,
            header,
            null_token: null_token.into(),
        })
    }

    pub fn delimiter(&self) -> char {
        char::from(self.delimiter)
    }

    pub fn header(&self) -> bool {
        self.header
    }

    pub fn null_token(&self) -> &str {
        &self.null_token
    }
}

type FileWriter = Writer<BufWriter<File>>;

/// One open load file.
struct CsvFile {
    path: PathBuf,
    writer: FileWriter,
    rows_written: u64,
}

/// Writes `{prefix}_article_{p}.csv` and `{prefix}_comment_{p}.csv`.
pub struct CsvSink {
    options: CsvOptions,
    partition: Option<PartitionId>,
    articles: Option<CsvFile>,
    comments: Option<CsvFile>,
}

impl CsvSink {
    pub fn new(options: CsvOptions) -> Self {
        Self {
            options,
            partition: None,
            articles: None,
            comments: None,
        }
    }

    /// Path of the file a row kind is written to.
    pub fn file_path(prefix: &str, kind: RowKind, partition: PartitionId) -> PathBuf {
        PathBuf::from(format!("{prefix}_{kind}_{partition}.csv"))
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    fn open<R: Record>(&self, prefix: &str, partition: PartitionId) -> Result<CsvFile, CsvSinkError> {
        let path = Self::file_path(prefix, R::KIND, partition);
        let file = File::create(&path)?;
        let buf_writer = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let mut writer = WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(false)
            .from_writer(buf_writer);

        if self.options.header {
            writer.write_record(R::column_names())?;
        }

        debug!("Opened CSV file '{}'", path.display());
        Ok(CsvFile {
            path,
            writer,
            rows_written: 0,
        })
    }

    fn write<R: Record>(
        file: Option<&mut CsvFile>,
        row: &R,
        null_token: &str,
    ) -> Result<(), SinkError> {
        let file = file.ok_or(SinkError::NotOpen("csv"))?;
        let record = fields_to_record(&row.fields(), null_token);
        file.writer
            .write_record(&record)
            .map_err(CsvSinkError::from)?;
        file.rows_written += 1;
        Ok(())
    }

    fn finish(file: CsvFile) -> Result<(), CsvSinkError> {
        let CsvFile {
            path,
            mut writer,
            rows_written,
        } = file;
        writer.flush()?;
        drop(writer);

        let file_size_bytes = std::fs::metadata(&path)?.len();
        info!(
            "CSV file '{}' complete: {} rows, {} bytes",
            path.display(),
            rows_written,
            file_size_bytes
        );
        Ok(())
    }
}

impl OutputSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn init(&mut self, prefix: &str, partition: PartitionId) -> Result<(), SinkError> {
        let articles = self.open::<ArticleRow>(prefix, partition)?;
        let comments = self.open::<CommentRow>(prefix, partition)?;
        info!(
            "Writing CSV for partition {} to '{}' and '{}'",
            partition,
            articles.path.display(),
            comments.path.display()
        );
        self.articles = Some(articles);
        self.comments = Some(comments);
        self.partition = Some(partition);
        Ok(())
    }

    fn emit_article(&mut self, row: &ArticleRow) -> Result<(), SinkError> {
        Self::write(self.articles.as_mut(), row, &self.options.null_token)
    }

    fn emit_comment(&mut self, row: &CommentRow) -> Result<(), SinkError> {
        Self::write(self.comments.as_mut(), row, &self.options.null_token)
    }

    /// Finishes both files even if the first fails; returns the first error.
    fn close(&mut self) -> Result<(), SinkError> {
        let mut first_error = None;
        for file in [self.articles.take(), self.comments.take()].into_iter().flatten() {
            if let Err(e) = Self::finish(file) {
                first_error.get_or_insert(e);
            }
        }
        self.partition = None;
        first_error.map_or(Ok(()), |e| Err(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn article(ticket_no: i64, last_comment_no: Option<i64>) -> ArticleRow {
        ArticleRow {
            service_id: 13,
            ticket_no,
            object_id: format!("obj-{ticket_no}"),
            comment_count: 2,
            display_comment_count: 2,
            last_comment_no,
            trackback_count: 0,
            reg_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn comment() -> CommentRow {
        CommentRow {
            service_id: 13,
            ticket_no: 1,
            object_id: "obj-1".to_string(),
            comment_no: 4,
            top_comment_no: 3,
            parent_comment_no: 3,
            depth: 1,
            position: 62,
            sort_key: "10000000000000000000".to_string(),
            reg_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap(),
        }
    }

    fn prefix(dir: &TempDir) -> String {
        dir.path().join("run").to_string_lossy().into_owned()
    }

    #[test]
    fn test_writes_header_and_rows() {
        let temp_dir = TempDir::new().unwrap();
        let prefix = prefix(&temp_dir);
        let mut sink = CsvSink::new(CsvOptions::default());

        sink.init(&prefix, 3).unwrap();
        sink.emit_article(&article(1, Some(4))).unwrap();
        sink.emit_article(&article(2, None)).unwrap();
        sink.emit_comment(&comment()).unwrap();
        sink.close().unwrap();

        let content =
            std::fs::read_to_string(CsvSink::file_path(&prefix, RowKind::Article, 3)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "service_id,ticket_no,object_id,comment_count,display_comment_count,last_comment_no,trackback_count,reg_time"
        );
        assert_eq!(lines[1], "13,1,obj-1,2,2,4,0,2024-01-01 00:00:00.000");
        assert_eq!(lines[2], "13,2,obj-2,2,2,,0,2024-01-01 00:00:00.000");

        let content =
            std::fs::read_to_string(CsvSink::file_path(&prefix, RowKind::Comment, 3)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "13,1,obj-1,4,3,3,1,62,10000000000000000000,2024-01-01 00:00:01.000"
        );
    }

    #[test]
    fn test_pipe_delimiter_without_header() {
        let temp_dir = TempDir::new().unwrap();
        let prefix = prefix(&temp_dir);
        let options = CsvOptions::new('|', false, "\\N").unwrap();
        let mut sink = CsvSink::new(options);

        sink.init(&prefix, 0).unwrap();
        sink.emit_article(&article(7, None)).unwrap();
        sink.close().unwrap();

        let content =
            std::fs::read_to_string(CsvSink::file_path(&prefix, RowKind::Article, 0)).unwrap();
        assert_eq!(content, "13|7|obj-7|2|2|\\N|0|2024-01-01 00:00:00.000\n");

        // Comment file exists, empty.
        let content =
            std::fs::read_to_string(CsvSink::file_path(&prefix, RowKind::Comment, 0)).unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn test_close_finishes_comments_when_articles_fail() {
        let temp_dir = TempDir::new().unwrap();
        let prefix = prefix(&temp_dir);
        let mut sink = CsvSink::new(CsvOptions::default());

        sink.init(&prefix, 2).unwrap();
        sink.emit_comment(&comment()).unwrap();
        std::fs::remove_file(CsvSink::file_path(&prefix, RowKind::Article, 2)).unwrap();

        assert!(matches!(sink.close(), Err(SinkError::Io(_))));
        let content =
            std::fs::read_to_string(CsvSink::file_path(&prefix, RowKind::Comment, 2)).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(matches!(
            sink.emit_comment(&comment()),
            Err(SinkError::NotOpen("csv"))
        ));
    }

    #[test]
    fn test_rejects_non_ascii_delimiter() {
        assert!(matches!(
            CsvOptions::new('¦', true, ""),
            Err(CsvSinkError::InvalidDelimiter('¦'))
        ));
    }

    #[test]
    fn test_emit_before_init_fails() {
        let mut sink = CsvSink::new(CsvOptions::default());
        assert!(matches!(
            sink.emit_comment(&comment()),
            Err(SinkError::NotOpen("csv"))
        ));
    }

    #[test]
    fn test_init_in_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let prefix = temp_dir
            .path()
            .join("missing")
            .join("run")
            .to_string_lossy()
            .into_owned();
        let mut sink = CsvSink::new(CsvOptions::default());
        assert!(matches!(sink.init(&prefix, 0), Err(SinkError::Io(_))));
    }
}

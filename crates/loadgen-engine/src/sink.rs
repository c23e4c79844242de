//! Per-partition sink fan-out plus the in-process sinks.

use crate::error::GenError;
use loadgen_core::{ArticleRow, CommentRow, OutputSink, PartitionId, SinkError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

/// Every sink registered for one partition.
pub struct SinkSet {
    partition: PartitionId,
    sinks: Vec<Box<dyn OutputSink>>,
}

impl SinkSet {
    pub fn new(partition: PartitionId, sinks: Vec<Box<dyn OutputSink>>) -> Self {
        Self { partition, sinks }
    }

    /// Open every sink with the shared path prefix.
    pub fn init(&mut self, prefix: &str) -> Result<(), GenError> {
        let partition = self.partition;
        for sink in &mut self.sinks {
            sink.init(prefix, partition)
                .map_err(|source| sink_error(sink.as_ref(), partition, source))?;
            info!("Opened {} sink for partition {}", sink.name(), partition);
        }
        Ok(())
    }

    pub fn emit_article(&mut self, row: &ArticleRow) -> Result<(), GenError> {
        let partition = self.partition;
        for sink in &mut self.sinks {
            sink.emit_article(row)
                .map_err(|source| sink_error(sink.as_ref(), partition, source))?;
        }
        Ok(())
    }

    pub fn emit_comment(&mut self, row: &CommentRow) -> Result<(), GenError> {
        let partition = self.partition;
        for sink in &mut self.sinks {
            sink.emit_comment(row)
                .map_err(|source| sink_error(sink.as_ref(), partition, source))?;
        }
        Ok(())
    }

    /// Close every sink; the first failure is returned after all were tried.
    pub fn close(&mut self) -> Result<(), GenError> {
        let partition = self.partition;
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(source) = sink.close() {
                first_error.get_or_insert(sink_error(sink.as_ref(), partition, source));
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn partition(&self) -> PartitionId {
        self.partition
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.sinks.iter().map(|s| s.name()).collect();
        f.debug_struct("SinkSet")
            .field("partition", &self.partition)
            .field("sinks", &names)
            .finish()
    }
}

fn sink_error(sink: &dyn OutputSink, partition: PartitionId, source: SinkError) -> GenError {
    GenError::Sink {
        sink: sink.name(),
        partition,
        source,
    }
}

/// Rows captured by a [`MemorySink`].
#[derive(Debug, Default, Clone)]
pub struct MemoryRows {
    pub articles: Vec<ArticleRow>,
    pub comments: Vec<CommentRow>,
    /// Partitions the sink was opened for
    pub opened: Vec<PartitionId>,
    pub closed: usize,
}

/// Collects rows in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    rows: Arc<Mutex<MemoryRows>>,
    open: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything captured so far.
    pub fn rows(&self) -> MemoryRows {
        self.lock().clone()
    }

    pub fn articles(&self) -> Vec<ArticleRow> {
        self.lock().articles.clone()
    }

    pub fn comments(&self) -> Vec<CommentRow> {
        self.lock().comments.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryRows> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<(), SinkError> {
        if self.open {
            Ok(())
        } else {
            Err(SinkError::NotOpen("memory"))
        }
    }
}

impl OutputSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn init(&mut self, _prefix: &str, partition: PartitionId) -> Result<(), SinkError> {
        self.open = true;
        self.lock().opened.push(partition);
        Ok(())
    }

    fn emit_article(&mut self, row: &ArticleRow) -> Result<(), SinkError> {
        self.ensure_open()?;
        self.lock().articles.push(row.clone());
        Ok(())
    }

    fn emit_comment(&mut self, row: &CommentRow) -> Result<(), SinkError> {
        self.ensure_open()?;
        self.lock().comments.push(row.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.open = false;
        self.lock().closed += 1;
        Ok(())
    }
}

/// Drops every row.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn name(&self) -> &'static str {
        "null"
    }

    fn init(&mut self, _prefix: &str, _partition: PartitionId) -> Result<(), SinkError> {
        Ok(())
    }

    fn emit_article(&mut self, _row: &ArticleRow) -> Result<(), SinkError> {
        Ok(())
    }

    fn emit_comment(&mut self, _row: &CommentRow) -> Result<(), SinkError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article() -> ArticleRow {
        ArticleRow {
            service_id: 5,
            ticket_no: 1,
            object_id: "obj".to_string(),
            comment_count: 0,
            display_comment_count: 0,
            last_comment_no: None,
            trackback_count: 0,
            reg_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    /// Fails every write.
    struct BrokenSink;

    impl OutputSink for BrokenSink {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn init(&mut self, _prefix: &str, _partition: PartitionId) -> Result<(), SinkError> {
            Ok(())
        }
        fn emit_article(&mut self, _row: &ArticleRow) -> Result<(), SinkError> {
            Err(SinkError::Io(std::io::Error::other("disk full")))
        }
        fn emit_comment(&mut self, _row: &CommentRow) -> Result<(), SinkError> {
            Ok(())
        }
        fn close(&mut self) -> Result<(), SinkError> {
            Err(SinkError::NotOpen("broken"))
        }
    }

    #[test]
    fn test_fan_out_reaches_every_sink() {
        let first = MemorySink::new();
        let second = MemorySink::new();
        let mut set = SinkSet::new(3, vec![Box::new(first.clone()), Box::new(second.clone())]);

        set.init("out").unwrap();
        set.emit_article(&article()).unwrap();
        set.close().unwrap();

        for sink in [first, second] {
            let rows = sink.rows();
            assert_eq!(rows.articles, vec![article()]);
            assert_eq!(rows.opened, vec![3]);
            assert_eq!(rows.closed, 1);
        }
    }

    #[test]
    fn test_memory_sink_rejects_rows_before_init() {
        let mut sink = MemorySink::new();
        assert!(matches!(
            sink.emit_article(&article()),
            Err(SinkError::NotOpen("memory"))
        ));
    }

    #[test]
    fn test_sink_failure_names_sink_and_partition() {
        let mut set = SinkSet::new(2, vec![Box::new(NullSink), Box::new(BrokenSink)]);
        set.init("out").unwrap();

        let err = set.emit_article(&article()).unwrap_err();
        assert!(matches!(
            err,
            GenError::Sink {
                sink: "broken",
                partition: 2,
                ..
            }
        ));
        assert!(set.close().is_err());
    }
}

//! Output sink construction by logical name.

use loadgen_core::{OutputSink, PartitionId, SinkConfig};
use loadgen_engine::NullSink;
use loadgen_sink_csv::{CsvOptions, CsvSink, CsvSinkError};
use loadgen_sink_jsonl::JsonlSink;

/// A validated sink definition, instantiated once per partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    Csv(CsvOptions),
    Jsonl,
    Null,
}

impl SinkKind {
    /// Validate a configured sink.
    pub fn from_config(config: &SinkConfig) -> Result<Self, CsvSinkError> {
        match config {
            SinkConfig::Csv {
                delimiter,
                header,
                null_token,
            } => Ok(SinkKind::Csv(CsvOptions::new(
                *delimiter,
                *header,
                null_token.clone(),
            )?)),
            SinkConfig::Jsonl => Ok(SinkKind::Jsonl),
        }
    }

    /// Logical name, as used in the run configuration.
    pub fn name(&self) -> &'static str {
        match self {
            SinkKind::Csv(_) => "csv",
            SinkKind::Jsonl => "jsonl",
            SinkKind::Null => "null",
        }
    }

    pub fn build(&self) -> Box<dyn OutputSink> {
        match self {
            SinkKind::Csv(options) => Box::new(CsvSink::new(options.clone())),
            SinkKind::Jsonl => Box::new(JsonlSink::new()),
            SinkKind::Null => Box::new(NullSink),
        }
    }
}

/// Sink kinds for a run; a dry run replaces every sink with one null sink.
pub fn sink_kinds(configs: &[SinkConfig], dry_run: bool) -> Result<Vec<SinkKind>, CsvSinkError> {
    if dry_run {
        return Ok(vec![SinkKind::Null]);
    }
    configs.iter().map(SinkKind::from_config).collect()
}

/// Factory closure handed to the run context.
pub fn sink_factory(
    kinds: &[SinkKind],
) -> impl FnMut(PartitionId) -> Vec<Box<dyn OutputSink>> + '_ {
    move |_partition| kinds.iter().map(SinkKind::build).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_config_order() {
        let configs = vec![
            SinkConfig::Jsonl,
            SinkConfig::Csv {
                delimiter: '|',
                header: false,
                null_token: "\\N".to_string(),
            },
        ];
        let kinds = sink_kinds(&configs, false).unwrap();
        let names: Vec<_> = kinds.iter().map(SinkKind::name).collect();
        assert_eq!(names, vec!["jsonl", "csv"]);

        let mut factory = sink_factory(&kinds);
        let sinks = factory(0);
        assert_eq!(sinks.len(), 2);
        assert_eq!(sinks[1].name(), "csv");
    }

    #[test]
    fn test_dry_run_uses_null_sink() {
        let kinds = sink_kinds(&[SinkConfig::Jsonl], true).unwrap();
        assert_eq!(kinds, vec![SinkKind::Null]);
    }

    #[test]
    fn test_invalid_delimiter_is_rejected() {
        let configs = vec![SinkConfig::Csv {
            delimiter: 'é',
            header: true,
            null_token: String::new(),
        }];
        assert!(sink_kinds(&configs, false).is_err());
    }
}

//! Delimited load-file sink for the cafe load generator.
//!
//! Each partition gets one file per row kind, named
//! `{prefix}_article_{partition}.csv` and `{prefix}_comment_{partition}.csv`.
//! The delimiter, header row and null token are configurable so the output
//! can be fed straight to bulk loaders that expect pipe-delimited files.
//!
//! # Example
//!
//! ```ignore
//! use loadgen_core::OutputSink;
//! use loadgen_sink_csv::{CsvOptions, CsvSink};
//!
//! let mut sink = CsvSink::new(CsvOptions::new('|', true, "")?);
//! sink.init("/tmp/out/run", 0)?;
//! sink.emit_article(&row)?;
//! sink.close()?;
//! ```

mod error;
mod sink;
pub mod value;

pub use error::CsvSinkError;
pub use sink::{CsvOptions, CsvSink, DEFAULT_BUFFER_SIZE};
pub use value::{CsvValue, TIMESTAMP_FORMAT};

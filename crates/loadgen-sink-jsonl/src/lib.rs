//! JSON lines sink for the cafe load generator.
//!
//! Each partition gets one file per row kind, named
//! `{prefix}_article_{partition}.jsonl` and
//! `{prefix}_comment_{partition}.jsonl`. Every line is one JSON object keyed
//! by column name.
//!
//! # Example
//!
//! ```ignore
//! use loadgen_core::OutputSink;
//! use loadgen_sink_jsonl::JsonlSink;
//!
//! let mut sink = JsonlSink::new();
//! sink.init("/tmp/out/run", 0)?;
//! sink.emit_comment(&row)?;
//! sink.close()?;
//! ```

mod error;
mod sink;
pub mod value;

pub use error::JsonlSinkError;
pub use sink::{JsonlSink, DEFAULT_BUFFER_SIZE};
pub use value::{field_to_json, record_to_json};

//! Core types for the cafe load generator.
//!
//! This crate provides the foundational types shared by the engine, the
//! output sinks and the CLI:
//!
//! - [`FieldValue`] - Tagged value of a single output column
//! - [`ArticleRow`] / [`CommentRow`] - Finished rows with fixed column schemas
//! - [`RunConfig`] - Run configuration loaded from YAML
//! - [`SamplerConfig`] - Sampler definitions referenced by the configuration
//! - [`OutputSink`] - The interface every output format implements
//!
//! # Architecture
//!
//! ```text
//! loadgen-core (this crate)
//!    │
//!    ├─── loadgen-engine      (scheduler, entities, allocator, samplers)
//!    │
//!    ├─── loadgen-sink-csv    (implements OutputSink for delimited files)
//!    └─── loadgen-sink-jsonl  (implements OutputSink for JSON lines)
//! ```
//!
//! # Example
//!
//! ```rust
//! use loadgen_core::{ArticleRow, Record};
//! use chrono::{TimeZone, Utc};
//!
//! let row = ArticleRow {
//!     service_id: 13,
//!     ticket_no: 1,
//!     object_id: "obj-3-0".to_string(),
//!     comment_count: 0,
//!     display_comment_count: 0,
//!     last_comment_no: None,
//!     trackback_count: 0,
//!     reg_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//! };
//! assert_eq!(row.fields().len(), ArticleRow::COLUMNS.len());
//! ```

pub mod config;
pub mod row;
pub mod sink;
pub mod values;

// Re-exports for convenience
pub use config::{
    CategoryConfig, ConfigError, PartitionConfig, RunConfig, SamplerConfig, SinkConfig,
};
pub use row::{ArticleRow, Column, CommentRow, Record, RowKind};
pub use sink::{OutputSink, SinkError};
pub use values::{FieldType, FieldValue};

/// Identifier of a partition ("table"). Equal to the residue its cafe ids share.
pub type PartitionId = u32;

/// Identifier of a cafe category ("cafe type").
pub type CategoryId = u32;

/// Globally unique cafe identifier.
pub type CafeId = u64;

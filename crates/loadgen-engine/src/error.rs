//! Error type for the generation engine.

use crate::samplers::SamplerBuildError;
use crate::sortkey::ThreadError;
use crate::weighted::ChoiceError;
use chrono::{DateTime, Utc};
use loadgen_core::{CafeId, ConfigError, SinkError};

/// Scope of a sample registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleScope {
    Global,
    Partition(u32),
    Category(u32),
}

impl std::fmt::Display for SampleScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleScope::Global => write!(f, "global"),
            SampleScope::Partition(p) => write!(f, "partition {p}"),
            SampleScope::Category(c) => write!(f, "category {c}"),
        }
    }
}

/// Errors raised by sample lookups.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// No sampler registered under the key in this scope
    #[error("No sampler '{key}' registered in {scope} registry")]
    KeyNotFound { scope: SampleScope, key: String },

    /// No registry exists for the partition or category
    #[error("No sample registry for {0}")]
    ScopeNotFound(SampleScope),

    #[error("Sampler '{key}' in {scope} registry produced {actual}, expected {expected}")]
    TypeMismatch {
        scope: SampleScope,
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Error type for generation runs.
///
/// Every variant is fatal: the run stops at the first one.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sampler error: {0}")]
    SamplerBuild(#[from] SamplerBuildError),

    #[error("Sample error: {0}")]
    Sample(#[from] SampleError),

    #[error("Thread error: {0}")]
    Thread(#[from] ThreadError),

    #[error("Selection error: {0}")]
    Choice(#[from] ChoiceError),

    /// A cafe id that the allocator never registered
    #[error("Cafe {0} is not registered")]
    UnknownCafe(CafeId),

    /// No sink set was opened for the partition
    #[error("Partition {0} has no sinks")]
    UnknownPartition(u32),

    /// Virtual time moved past the representable range
    #[error("Virtual time overflowed adding {gap} to {at}")]
    TimeOverflow {
        at: DateTime<Utc>,
        gap: chrono::Duration,
    },

    /// Another worker failed first
    #[error("Run aborted after a failure in another worker")]
    Aborted,

    #[error("Sink '{sink}' failed for partition {partition}: {source}")]
    Sink {
        sink: &'static str,
        partition: u32,
        #[source]
        source: SinkError,
    },
}

//! Discrete-event engine for the cafe load generator.
//!
//! The engine turns a [`RunConfig`](loadgen_core::RunConfig) into a stream of
//! article and comment rows with realistic arrival timing and reply-thread
//! structure, bounded by a total comment budget.
//!
//! # Architecture
//!
//! ```text
//! RunConfig (YAML)
//!        │
//!        ▼
//! ┌──────────────────────────────┐
//! │  RunContext (shared, Arc)    │
//! │                              │
//! │  - SampleContext             │──── CafeAllocator, scoped samplers
//! │  - CommentBudget             │
//! │  - SinkSet per partition     │──── OutputSink implementations
//! └──────────────┬───────────────┘
//!                │ seed()
//!                ▼
//! ┌──────────────────────────────┐
//! │  Scheduler (one per worker)  │
//! │                              │
//! │  ArticleEvent ──► CommentEvent x N
//! │       │                      │
//! │       └──► next ArticleEvent │
//! └──────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use loadgen_core::{OutputSink, RunConfig};
//! use loadgen_engine::{MemorySink, RunContext};
//!
//! let config = RunConfig::from_yaml(r#"
//! start_time: "2024-01-01T00:00:00Z"
//! target_comments: 20
//! id_modulus: 2
//! article_gap: { type: exponential, mean: 1000 }
//! comment_gap: { type: exponential, mean: 100 }
//! global_samplers:
//!   reply_probability: { type: weighted_bool, true_weight: 0.5 }
//! categories:
//!   - id: 0
//!     samplers:
//!       reply_count: { type: int_range, min: 1, max: 5 }
//! partitions:
//!   - id: 1
//!     cells: { 0: 3 }
//! "#).unwrap();
//!
//! let sink = MemorySink::new();
//! let handle = sink.clone();
//! let ctx = RunContext::new(&config, "demo", move |_| {
//!     vec![Box::new(handle.clone()) as Box<dyn OutputSink>]
//! }).unwrap();
//!
//! let mut schedulers = vec![ctx.scheduler(0)];
//! ctx.seed(&mut schedulers);
//! schedulers[0].run(&ctx).unwrap();
//! ctx.close_sinks().unwrap();
//!
//! assert!(sink.comments().len() <= 20);
//! ```

pub mod allocator;
pub mod article;
pub mod comment;
pub mod context;
pub mod error;
pub mod samplers;
pub mod samples;
pub mod scheduler;
pub mod sink;
pub mod sortkey;
pub mod store;
pub mod thread;
pub mod weighted;

// Re-exports for convenience
pub use allocator::{Cafe, CafeAllocator, CellAllocation};
pub use article::{thread_order, ArticleEvent};
pub use comment::CommentEvent;
pub use context::{CommentBudget, RunContext};
pub use error::{GenError, SampleError, SampleScope};
pub use samplers::{derive_seed, SampleValue, Sampler};
pub use samples::{SampleContext, SampleRegistry};
pub use scheduler::{Event, Scheduler};
pub use sink::{MemoryRows, MemorySink, NullSink, SinkSet};
pub use sortkey::{SortKey, ThreadError, MAX_LEVEL, MAX_POSITION};
pub use store::{PrivateObjectStore, SyncObjectStore};
pub use thread::{CommentNode, ReplyTree};
pub use weighted::{ChoiceError, WeightedChoice};

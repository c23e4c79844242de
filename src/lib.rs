//! Cafe load generator library.
//!
//! Drives the discrete-event engine in `loadgen-engine` from the command
//! line: loads a YAML run configuration, builds the configured output sinks
//! for every partition, runs one event queue per worker thread against a
//! shared comment budget, and reports a run summary.
//!
//! # CLI Usage
//!
//! ```bash
//! # Generate pipe-delimited load files with four workers
//! cafe-loadgen generate --config run.yaml --output-dir out --workers 4
//!
//! # Run the simulation without writing anything
//! cafe-loadgen generate --config run.yaml --dry-run
//!
//! # Print the cafe allocation per (category, partition) cell
//! cafe-loadgen plan --config run.yaml
//! ```

pub mod args;
pub mod generate;
pub mod plan;
pub mod sinks;

pub use args::{GenerateArgs, PlanArgs};
pub use generate::{run_generate, run_generation, run_with_sinks, run_workers, RunSummary};
pub use plan::{render_plan, run_plan};
pub use sinks::{sink_factory, sink_kinds, SinkKind};

//! `generate` command: multi-worker run driver and run summary.

use crate::args::GenerateArgs;
use crate::sinks::{sink_factory, sink_kinds, SinkKind};
use anyhow::Context;
use loadgen_core::{OutputSink, PartitionId, RunConfig};
use loadgen_engine::{GenError, RunContext};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics from a generation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Article rows emitted.
    pub articles: u64,
    /// Comment rows emitted.
    pub comments: u64,
    /// Regular articles turned away by the comment budget.
    pub denied_articles: u64,
    /// Worker threads used.
    pub workers: usize,
    /// Wall-clock time of the event loop.
    pub total_duration: Duration,
}

impl RunSummary {
    /// Total rows emitted.
    pub fn rows(&self) -> u64 {
        self.articles + self.comments
    }

    /// Calculate rows per second.
    pub fn rows_per_second(&self) -> f64 {
        if self.total_duration.as_secs_f64() > 0.0 {
            self.rows() as f64 / self.total_duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} articles, {} comments ({} rows) in {:?} with {} worker(s) ({:.2} rows/sec)",
            self.articles,
            self.comments,
            self.rows(),
            self.total_duration,
            self.workers,
            self.rows_per_second()
        )
    }
}

/// Run every worker to completion against one shared context.
///
/// Returns the rows emitted. When a worker fails the others stop at their
/// next event, and the first real failure is returned.
pub fn run_workers(ctx: &RunContext, workers: usize) -> Result<u64, GenError> {
    let mut schedulers: Vec<_> = (0..workers.max(1)).map(|w| ctx.scheduler(w)).collect();
    let queued = ctx.seed(&mut schedulers);
    info!(
        "Seeded {} initial articles across {} worker(s)",
        queued,
        schedulers.len()
    );

    std::thread::scope(|scope| {
        let handles: Vec<_> = schedulers
            .into_iter()
            .map(|mut scheduler| scope.spawn(move || scheduler.run(ctx)))
            .collect();

        let mut emitted = 0;
        let mut failure: Option<GenError> = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(rows)) => emitted += rows,
                Ok(Err(GenError::Aborted)) => {
                    failure.get_or_insert(GenError::Aborted);
                }
                Ok(Err(e)) => {
                    if matches!(failure, None | Some(GenError::Aborted)) {
                        failure = Some(e);
                    }
                }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        failure.map_or(Ok(emitted), Err)
    })
}

/// Build the context, run the workers and close every sink.
pub fn run_generation(
    config: &RunConfig,
    output_prefix: &str,
    workers: usize,
    sinks: &[SinkKind],
) -> Result<RunSummary, GenError> {
    run_with_sinks(config, output_prefix, workers, sink_factory(sinks))
}

/// Like [`run_generation`], with the per-partition sinks built by `make_sinks`.
///
/// Sinks are closed even when a worker fails; the worker's error wins over
/// a close failure.
pub fn run_with_sinks<F>(
    config: &RunConfig,
    output_prefix: &str,
    workers: usize,
    make_sinks: F,
) -> Result<RunSummary, GenError>
where
    F: FnMut(PartitionId) -> Vec<Box<dyn OutputSink>>,
{
    let ctx = RunContext::new(config, output_prefix, make_sinks)?;

    let start = Instant::now();
    let result = run_workers(&ctx, workers);
    let total_duration = start.elapsed();
    let closed = ctx.close_sinks();
    result?;
    closed?;

    Ok(RunSummary {
        articles: ctx.articles(),
        comments: ctx.comments(),
        denied_articles: ctx.denied(),
        workers: workers.max(1),
        total_duration,
    })
}

/// Run the generate command.
pub fn run_generate(args: &GenerateArgs) -> anyhow::Result<RunSummary> {
    let mut config = RunConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load run configuration from {:?}", args.config))?;
    args.apply_overrides(&mut config);

    let kinds = sink_kinds(&config.sinks, args.dry_run).context("Invalid sink configuration")?;
    if !args.dry_run {
        std::fs::create_dir_all(&args.output_dir).with_context(|| {
            format!("Failed to create output directory: {:?}", args.output_dir)
        })?;
    }

    info!(
        "Generating {} comments with seed {} using sinks [{}]",
        config.target_comments,
        config.seed,
        kinds.iter().map(SinkKind::name).collect::<Vec<_>>().join(", ")
    );

    let summary = run_generation(&config, &args.output_prefix(), args.workers, &kinds)
        .context("Generation failed")?;

    info!("Generation complete: {summary}");
    Ok(summary)
}

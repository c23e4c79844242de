//! Shared run state: the comment budget, arrival-gap samplers, and row
//! routing from entities to per-partition sinks.
//!
//! One [`RunContext`] is shared by every worker. Each worker owns its own
//! [`Scheduler`]; all cross-worker state here is either atomic or behind a
//! per-partition mutex.

use crate::article::ArticleEvent;
use crate::error::{GenError, SampleError, SampleScope};
use crate::samplers::{derive_seed, Sampler};
use crate::samples::SampleContext;
use crate::scheduler::Scheduler;
use crate::sink::SinkSet;
use chrono::{DateTime, Duration, Utc};
use loadgen_core::{ArticleRow, CommentRow, OutputSink, PartitionId, RunConfig};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Admission control capping the total number of comments.
#[derive(Debug)]
pub struct CommentBudget {
    target: u64,
    reserved: AtomicU64,
    committed: AtomicU64,
}

impl CommentBudget {
    pub fn new(target: u64) -> Self {
        Self {
            target,
            reserved: AtomicU64::new(0),
            committed: AtomicU64::new(0),
        }
    }

    /// Reserve `n` comment slots. Succeeds only if the total reserved stays
    /// below the target; on failure nothing is reserved.
    pub fn reserve(&self, n: u64) -> bool {
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |reserved| {
                reserved.checked_add(n).filter(|&total| total < self.target)
            })
            .is_ok()
    }

    /// Count `n` emitted comments.
    pub fn commit(&self, n: u64) {
        self.committed.fetch_add(n, Ordering::AcqRel);
    }

    /// True once either the committed or the reserved count reached the target.
    pub fn no_more_articles(&self) -> bool {
        self.committed() >= self.target || self.reserved() >= self.target
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn reserved(&self) -> u64 {
        self.reserved.load(Ordering::Acquire)
    }

    pub fn committed(&self) -> u64 {
        self.committed.load(Ordering::Acquire)
    }
}

/// Global run parameters, the budget and the sinks.
pub struct RunContext {
    seed: u64,
    start_time: DateTime<Utc>,
    samples: SampleContext,
    article_gap: Sampler,
    comment_gap: Sampler,
    budget: CommentBudget,
    cafe_store_capacity: usize,
    sinks: BTreeMap<PartitionId, Mutex<SinkSet>>,
    articles: AtomicU64,
    denied: AtomicU64,
    aborted: AtomicBool,
}

impl RunContext {
    /// Build the context and open one sink set per partition.
    ///
    /// `make_sinks` is called once per configured partition; every sink it
    /// returns is opened with `prefix` before any event runs.
    pub fn new<F>(config: &RunConfig, prefix: &str, mut make_sinks: F) -> Result<Self, GenError>
    where
        F: FnMut(PartitionId) -> Vec<Box<dyn OutputSink>>,
    {
        config.validate()?;
        let samples = SampleContext::from_config(config)?;

        let article_gap = Sampler::from_config(
            "article_gap",
            &config.article_gap,
            "",
            derive_seed(config.seed, "global", "article_gap"),
        )?;
        let comment_gap = Sampler::from_config(
            "comment_gap",
            &config.comment_gap,
            "",
            derive_seed(config.seed, "global", "comment_gap"),
        )?;

        let mut sinks = BTreeMap::new();
        for partition in &config.partitions {
            let mut set = SinkSet::new(partition.id, make_sinks(partition.id));
            set.init(prefix)?;
            sinks.insert(partition.id, Mutex::new(set));
        }

        info!(
            "Run context ready: {} cafes in {} partitions, comment target {}",
            samples.allocator().len(),
            sinks.len(),
            config.target_comments
        );

        Ok(Self {
            seed: config.seed,
            start_time: config.start_time,
            samples,
            article_gap,
            comment_gap,
            budget: CommentBudget::new(config.target_comments),
            cafe_store_capacity: config.cafe_store_capacity,
            sinks,
            articles: AtomicU64::new(0),
            denied: AtomicU64::new(0),
            aborted: AtomicBool::new(false),
        })
    }

    /// Scheduler for `worker`, seeded from the run seed.
    pub fn scheduler(&self, worker: usize) -> Scheduler {
        let seed = derive_seed(self.seed, "worker", &worker.to_string());
        Scheduler::new(worker, seed, self.start_time)
    }

    /// Queue the initial articles.
    ///
    /// One seed article per cafe, dealt round-robin across the schedulers,
    /// plus one regular article per scheduler. Returns the number queued.
    pub fn seed(&self, schedulers: &mut [Scheduler]) -> usize {
        if schedulers.is_empty() {
            return 0;
        }
        let workers = schedulers.len();
        let cafes = self.samples.allocator().cafes();
        for (i, cafe) in cafes.iter().enumerate() {
            let article = ArticleEvent::seed(cafe.id, self.start_time);
            schedulers[i % workers].schedule(Box::new(article));
        }
        for scheduler in schedulers.iter_mut() {
            scheduler.schedule(Box::new(ArticleEvent::floating(self.start_time)));
        }
        cafes.len() + workers
    }

    /// Fan a finished article out to every sink of `partition`.
    pub fn emit_article(&self, partition: PartitionId, row: &ArticleRow) -> Result<(), GenError> {
        self.with_sinks(partition, |set| set.emit_article(row))?;
        self.articles.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Fan a finished comment out to every sink of `partition`.
    pub fn emit_comment(&self, partition: PartitionId, row: &CommentRow) -> Result<(), GenError> {
        self.with_sinks(partition, |set| set.emit_comment(row))
    }

    fn with_sinks<T>(
        &self,
        partition: PartitionId,
        f: impl FnOnce(&mut SinkSet) -> Result<T, GenError>,
    ) -> Result<T, GenError> {
        let set = self
            .sinks
            .get(&partition)
            .ok_or(GenError::UnknownPartition(partition))?;
        let mut guard = set.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Close every sink set. All sets are closed even if one fails; the first
    /// failure is returned.
    pub fn close_sinks(&self) -> Result<(), GenError> {
        let mut first_error = None;
        for set in self.sinks.values() {
            let mut guard = set.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = guard.close() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Next article inter-arrival gap.
    pub fn next_article_gap(&self) -> Result<Duration, GenError> {
        gap(&self.article_gap, "article_gap")
    }

    /// Next comment inter-arrival gap.
    pub fn next_comment_gap(&self) -> Result<Duration, GenError> {
        gap(&self.comment_gap, "comment_gap")
    }

    /// Tell every worker to stop at its next event.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    pub(crate) fn record_denied(&self) {
        self.denied.fetch_add(1, Ordering::AcqRel);
    }

    pub fn samples(&self) -> &SampleContext {
        &self.samples
    }

    pub fn budget(&self) -> &CommentBudget {
        &self.budget
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn cafe_store_capacity(&self) -> usize {
        self.cafe_store_capacity
    }

    /// Articles emitted so far.
    pub fn articles(&self) -> u64 {
        self.articles.load(Ordering::Acquire)
    }

    /// Comments emitted so far.
    pub fn comments(&self) -> u64 {
        self.budget.committed()
    }

    /// Regular articles turned away by the budget.
    pub fn denied(&self) -> u64 {
        self.denied.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("start_time", &self.start_time)
            .field("budget", &self.budget)
            .field("cafes", &self.samples.allocator().len())
            .field("partitions", &self.sinks.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Draw a gap in milliseconds; negative draws clamp to zero.
fn gap(sampler: &Sampler, key: &str) -> Result<Duration, GenError> {
    let value = sampler.next_value();
    let millis = value.as_f64().ok_or_else(|| SampleError::TypeMismatch {
        scope: SampleScope::Global,
        key: key.to_string(),
        expected: "float",
        actual: value.kind(),
    })?;
    let micros = (millis.max(0.0) * 1000.0).round();
    Ok(Duration::microseconds(micros.min(i64::MAX as f64) as i64))
}

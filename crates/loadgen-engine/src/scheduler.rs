//! Virtual-time event queue and its run-to-completion loop.

use crate::context::RunContext;
use crate::error::GenError;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use tracing::debug;

/// Rows between progress log lines.
pub const PROGRESS_INTERVAL: u64 = 100_000;

/// Anything orderable by a virtual timestamp.
pub trait Event: Send + fmt::Debug {
    /// Virtual time at which the event fires.
    fn at(&self) -> DateTime<Utc>;

    /// Fire the event. May schedule further events and emit rows through
    /// `ctx`; returns the number of rows emitted.
    fn process(
        self: Box<Self>,
        scheduler: &mut Scheduler,
        now: DateTime<Utc>,
        ctx: &RunContext,
    ) -> Result<u64, GenError>;
}

#[derive(Debug)]
struct Pending {
    at: DateTime<Utc>,
    seq: u64,
    event: Box<dyn Event>,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .cmp(&other.at)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Time-ordered priority queue driving one worker.
///
/// Events with equal timestamps fire in insertion order.
#[derive(Debug)]
pub struct Scheduler {
    worker: usize,
    queue: BinaryHeap<Reverse<Pending>>,
    seq: u64,
    now: DateTime<Utc>,
    emitted: u64,
    processed: u64,
    /// Structural draws (reply placement, cafe selection)
    rng: StdRng,
}

impl Scheduler {
    pub fn new(worker: usize, seed: u64, start_time: DateTime<Utc>) -> Self {
        Self {
            worker,
            queue: BinaryHeap::new(),
            seq: 0,
            now: start_time,
            emitted: 0,
            processed: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Queue an event. Once scheduled it always fires.
    pub fn schedule(&mut self, event: Box<dyn Event>) {
        let pending = Pending {
            at: event.at(),
            seq: self.seq,
            event,
        };
        self.seq += 1;
        self.queue.push(Reverse(pending));
    }

    /// Fire events in time order until the queue drains.
    ///
    /// Returns the rows emitted by this call. A failure marks the context
    /// aborted so other workers sharing it stop too.
    pub fn run(&mut self, ctx: &RunContext) -> Result<u64, GenError> {
        let before = self.emitted;
        while let Some(Reverse(Pending { at, event, .. })) = self.queue.pop() {
            if ctx.is_aborted() {
                return Err(GenError::Aborted);
            }
            self.now = at;
            let emitted = match event.process(self, at, ctx) {
                Ok(emitted) => emitted,
                Err(e) => {
                    ctx.abort();
                    return Err(e);
                }
            };
            self.processed += 1;

            let previous = self.emitted;
            self.emitted += emitted;
            if previous / PROGRESS_INTERVAL != self.emitted / PROGRESS_INTERVAL {
                debug!(
                    "Worker {}: {} rows emitted, virtual time {}, {} events queued",
                    self.worker,
                    self.emitted,
                    self.now,
                    self.queue.len()
                );
            }
        }
        Ok(self.emitted - before)
    }

    /// Current virtual time: the timestamp of the last fired event.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

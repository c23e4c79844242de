//! Comment events.

use crate::context::RunContext;
use crate::error::GenError;
use crate::scheduler::{Event, Scheduler};
use chrono::{DateTime, Utc};
use loadgen_core::{CommentRow, PartitionId};

/// A fully derived comment waiting for its arrival time.
///
/// Everything in the row is computed when the owning article builds its
/// reply tree; firing only writes it out.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentEvent {
    partition: PartitionId,
    row: CommentRow,
}

impl CommentEvent {
    pub fn new(partition: PartitionId, row: CommentRow) -> Self {
        Self { partition, row }
    }

    pub fn row(&self) -> &CommentRow {
        &self.row
    }
}

impl Event for CommentEvent {
    fn at(&self) -> DateTime<Utc> {
        self.row.reg_time
    }

    fn process(
        self: Box<Self>,
        _scheduler: &mut Scheduler,
        _now: DateTime<Utc>,
        ctx: &RunContext,
    ) -> Result<u64, GenError> {
        ctx.emit_comment(self.partition, &self.row)?;
        ctx.budget().commit(1);
        Ok(1)
    }
}

//! Article events: the self-renewing arrival process that spawns comment
//! threads.
//!
//! Two kinds exist. A *seed* article is bound to one cafe so every cafe
//! gets at least one article; it always asks for a single comment and never
//! renews. A *regular* article draws its cafe when it fires, asks the budget
//! for a sampled number of comments, and schedules the next regular article
//! while the budget lasts.

use crate::comment::CommentEvent;
use crate::context::RunContext;
use crate::error::{GenError, SampleScope};
use crate::scheduler::{Event, Scheduler};
use crate::sortkey::ThreadError;
use crate::thread::ReplyTree;
use chrono::{DateTime, Duration, Utc};
use loadgen_core::{ArticleRow, CafeId, CommentRow};
use tracing::warn;

/// Global key: whether a new comment replies to an existing one.
pub const REPLY_PROBABILITY: &str = "reply_probability";
/// Partition key: article ticket number.
pub const TICKET_NO: &str = "ticket_no";
/// Partition key: article object id.
pub const OBJECT_ID: &str = "object_id";
/// Partition key: comment number.
pub const COMMENT_NO: &str = "comment_no";
/// Category key: comments requested by a regular article.
pub const REPLY_COUNT: &str = "reply_count";

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleEvent {
    at: DateTime<Utc>,
    /// Bound cafe; `None` draws one at fire time
    cafe: Option<CafeId>,
    seed: bool,
}

impl ArticleEvent {
    /// Seed article for `cafe`.
    pub fn seed(cafe: CafeId, at: DateTime<Utc>) -> Self {
        Self {
            at,
            cafe: Some(cafe),
            seed: true,
        }
    }

    /// Regular article whose cafe is drawn when it fires.
    pub fn floating(at: DateTime<Utc>) -> Self {
        Self {
            at,
            cafe: None,
            seed: false,
        }
    }

    pub fn is_seed(&self) -> bool {
        self.seed
    }

    pub fn cafe(&self) -> Option<CafeId> {
        self.cafe
    }
}

impl Event for ArticleEvent {
    fn at(&self) -> DateTime<Utc> {
        self.at
    }

    fn process(
        self: Box<Self>,
        scheduler: &mut Scheduler,
        now: DateTime<Utc>,
        ctx: &RunContext,
    ) -> Result<u64, GenError> {
        let samples = ctx.samples();
        let cafe = match self.cafe {
            Some(id) => samples.allocator().resolve(id)?,
            None => samples.choose_cafe(scheduler.rng())?,
        };
        let budget = ctx.budget();

        let reply_count = if self.seed {
            if budget.reserve(1) {
                1
            } else {
                0
            }
        } else {
            let drawn = samples
                .next_int(&SampleScope::Category(cafe.category), REPLY_COUNT)?
                .max(0) as u64;
            if budget.no_more_articles() || !budget.reserve(drawn) {
                warn!(
                    "Worker {}: article for cafe {} denied {} comments, {} of {} reserved",
                    scheduler.worker(),
                    cafe.id,
                    drawn,
                    budget.reserved(),
                    budget.target()
                );
                ctx.record_denied();
                return Ok(0);
            }
            drawn
        };

        let partition = SampleScope::Partition(cafe.partition);
        let ticket_no = samples.next_int(&partition, TICKET_NO)?;
        let object_id = samples.next_string(&partition, OBJECT_ID)?;

        let mut tree = ReplyTree::new();
        let mut arrival = now;
        let mut last_comment_no = None;
        for _ in 0..reply_count {
            arrival = advance(arrival, ctx.next_comment_gap()?)?;
            let reply = samples.next_bool(&SampleScope::Global, REPLY_PROBABILITY)?;
            let comment_no = samples.next_int(&partition, COMMENT_NO)?;

            let parent = if reply {
                tree.choose_open(scheduler.rng())
            } else {
                None
            };
            let index = match parent {
                Some(parent) => tree.add_reply(parent, comment_no)?,
                None => tree.add_root(comment_no),
            };

            let node = tree.get(index).ok_or(ThreadError::UnknownComment(index))?;
            let top_comment_no = tree
                .top_ancestor(index)
                .ok_or(ThreadError::UnknownComment(index))?;
            let parent_comment_no = tree
                .parent_no(index)
                .ok_or(ThreadError::UnknownComment(index))?;

            let row = CommentRow {
                service_id: cafe.id,
                ticket_no,
                object_id: object_id.clone(),
                comment_no,
                top_comment_no,
                parent_comment_no,
                depth: node.level,
                position: node.position,
                sort_key: node.sort_key.to_string(),
                reg_time: arrival,
            };
            scheduler.schedule(Box::new(CommentEvent::new(cafe.partition, row)));
            last_comment_no = Some(comment_no);
        }

        let row = ArticleRow {
            service_id: cafe.id,
            ticket_no,
            object_id: object_id.clone(),
            comment_count: reply_count,
            display_comment_count: reply_count,
            last_comment_no,
            trackback_count: 0,
            reg_time: now,
        };
        ctx.emit_article(cafe.partition, &row)?;
        cafe.store()
            .set_bounded(scheduler.rng(), object_id, ctx.cafe_store_capacity());

        if !self.seed && !budget.no_more_articles() {
            let next = advance(now, ctx.next_article_gap()?)?;
            scheduler.schedule(Box::new(ArticleEvent::floating(next)));
        }

        Ok(1)
    }
}

fn advance(at: DateTime<Utc>, gap: Duration) -> Result<DateTime<Utc>, GenError> {
    at.checked_add_signed(gap).ok_or(GenError::TimeOverflow { at, gap })
}

/// Comment rows of one article, sorted the way a reader would see them.
///
/// A first reply shares its parent's key, so equal keys fall back to depth.
pub fn thread_order(mut rows: Vec<CommentRow>) -> Vec<CommentRow> {
    rows.sort_by(|a, b| {
        a.top_comment_no
            .cmp(&b.top_comment_no)
            .then_with(|| a.sort_key.cmp(&b.sort_key))
            .then_with(|| a.depth.cmp(&b.depth))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::{context_from_yaml, SINGLE_CAFE};
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_regular_article_builds_root_comments() {
        let (ctx, sink) = context_from_yaml(SINGLE_CAFE, 10);
        let mut scheduler = Scheduler::new(0, 7, start());

        let article = Box::new(ArticleEvent::floating(start()));
        assert_eq!(article.process(&mut scheduler, start(), &ctx).unwrap(), 1);

        // 3 comments plus the renewed article.
        assert_eq!(scheduler.len(), 4);
        assert_eq!(ctx.budget().reserved(), 3);

        let articles = sink.articles();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].comment_count, 3);
        assert_eq!(articles[0].last_comment_no, Some(3));
        assert_eq!(articles[0].service_id, 5);
    }

    #[test]
    fn test_seed_article_asks_for_one_comment_and_never_renews() {
        let (ctx, sink) = context_from_yaml(SINGLE_CAFE, 10);
        let mut scheduler = Scheduler::new(0, 7, start());

        let article = Box::new(ArticleEvent::seed(5, start()));
        assert_eq!(article.process(&mut scheduler, start(), &ctx).unwrap(), 1);

        assert_eq!(scheduler.len(), 1);
        assert_eq!(ctx.budget().reserved(), 1);
        assert_eq!(sink.articles()[0].comment_count, 1);
    }

    #[test]
    fn test_seed_article_emits_even_without_budget() {
        let (ctx, sink) = context_from_yaml(SINGLE_CAFE, 0);
        let mut scheduler = Scheduler::new(0, 7, start());

        let article = Box::new(ArticleEvent::seed(5, start()));
        assert_eq!(article.process(&mut scheduler, start(), &ctx).unwrap(), 1);

        assert!(scheduler.is_empty());
        let articles = sink.articles();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].comment_count, 0);
        assert_eq!(articles[0].last_comment_no, None);
    }

    #[test]
    fn test_regular_article_denied_emits_nothing() {
        let (ctx, sink) = context_from_yaml(SINGLE_CAFE, 2);
        let mut scheduler = Scheduler::new(0, 7, start());

        let article = Box::new(ArticleEvent::floating(start()));
        assert_eq!(article.process(&mut scheduler, start(), &ctx).unwrap(), 0);

        assert!(scheduler.is_empty());
        assert!(sink.articles().is_empty());
        assert_eq!(ctx.budget().reserved(), 0);
        assert_eq!(ctx.denied(), 1);
    }

    #[test]
    fn test_unknown_seed_cafe_is_fatal() {
        let (ctx, _sink) = context_from_yaml(SINGLE_CAFE, 10);
        let mut scheduler = Scheduler::new(0, 7, start());

        let article = Box::new(ArticleEvent::seed(6, start()));
        assert!(matches!(
            article.process(&mut scheduler, start(), &ctx),
            Err(GenError::UnknownCafe(6))
        ));
    }

    #[test]
    fn test_object_id_recorded_in_cafe_store() {
        let (ctx, _sink) = context_from_yaml(SINGLE_CAFE, 10);
        let mut scheduler = Scheduler::new(0, 7, start());

        Box::new(ArticleEvent::seed(5, start()))
            .process(&mut scheduler, start(), &ctx)
            .unwrap();

        let cafe = ctx.samples().allocator().resolve(5).unwrap();
        assert_eq!(cafe.store().len(), 1);
    }

    const HUGE_GAP: &str = "100000000000000000";

    #[test]
    fn test_comment_gap_overflow_is_an_error() {
        let yaml = SINGLE_CAFE.replace(
            "comment_gap: { type: static, value: 100 }",
            &format!("comment_gap: {{ type: static, value: {HUGE_GAP} }}"),
        );
        let (ctx, sink) = context_from_yaml(&yaml, 10);
        let mut scheduler = Scheduler::new(0, 7, start());

        let article = Box::new(ArticleEvent::floating(start()));
        assert!(matches!(
            article.process(&mut scheduler, start(), &ctx),
            Err(GenError::TimeOverflow { .. })
        ));
        assert!(sink.articles().is_empty());
    }

    #[test]
    fn test_article_gap_overflow_stops_the_run() {
        let yaml = SINGLE_CAFE
            .replace(
                "article_gap: { type: static, value: 1000 }",
                &format!("article_gap: {{ type: static, value: {HUGE_GAP} }}"),
            )
            .replace(
                "reply_count: { type: static, value: 3 }",
                "reply_count: { type: static, value: 0 }",
            );
        let (ctx, _sink) = context_from_yaml(&yaml, 10);
        let mut scheduler = ctx.scheduler(0);
        scheduler.schedule(Box::new(ArticleEvent::floating(start())));

        assert!(matches!(scheduler.run(&ctx), Err(GenError::TimeOverflow { .. })));
        assert!(ctx.is_aborted());
    }

    #[test]
    fn test_thread_order_groups_by_root() {
        let row = |comment_no, top, key: &str| CommentRow {
            service_id: 1,
            ticket_no: 1,
            object_id: "o".to_string(),
            comment_no,
            top_comment_no: top,
            parent_comment_no: top,
            depth: 0,
            position: 0,
            sort_key: key.to_string(),
            reg_time: start(),
        };
        let ordered = thread_order(vec![
            row(3, 1, "01000000000000000000"),
            row(2, 2, "00000000000000000000"),
            row(1, 1, "00000000000000000000"),
        ]);
        let numbers: Vec<_> = ordered.iter().map(|r| r.comment_no).collect();
        assert_eq!(numbers, vec![1, 3, 2]);
    }
}

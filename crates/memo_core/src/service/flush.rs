//! Debounced flush scheduling.
//!
//! # Responsibility
//! - Track memo ids with unsaved in-memory changes.
//! - Decide when a batched flush is due.
//!
//! # Invariants
//! - Every `mark_dirty` pushes the deadline to `now + quiet_period`.
//! - A deadline exists iff the dirty set is non-empty.

use crate::model::memo::MemoId;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

/// Default time without new mutations before a flush is due.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);

/// Dirty set plus a resettable flush deadline.
#[derive(Debug, Clone)]
pub struct FlushScheduler {
    quiet_period: Duration,
    dirty: BTreeSet<MemoId>,
    deadline: Option<Instant>,
}

impl Default for FlushScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl FlushScheduler {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            dirty: BTreeSet::new(),
            deadline: None,
        }
    }

    /// Marks one id dirty and restarts the quiet period.
    pub fn mark_dirty(&mut self, id: impl Into<MemoId>, now: Instant) {
        self.dirty.insert(id.into());
        self.deadline = Some(now + self.quiet_period);
    }

    /// Marks several ids dirty with one deadline reset.
    pub fn mark_all_dirty<I>(&mut self, ids: I, now: Instant)
    where
        I: IntoIterator,
        I::Item: Into<MemoId>,
    {
        let before = self.dirty.len();
        self.dirty.extend(ids.into_iter().map(Into::into));
        if self.dirty.len() != before || self.deadline.is_some() {
            self.deadline = Some(now + self.quiet_period);
        }
    }

    /// Drops an id that no longer needs saving, e.g. after deletion.
    pub fn forget(&mut self, id: &str) {
        self.dirty.remove(id);
        if self.dirty.is_empty() {
            self.deadline = None;
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Drains the dirty set when the deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<Vec<MemoId>> {
        if self.is_due(now) {
            Some(self.take_all())
        } else {
            None
        }
    }

    /// Drains the dirty set regardless of the deadline.
    pub fn take_all(&mut self) -> Vec<MemoId> {
        self.deadline = None;
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    /// Discards pending work.
    pub fn cancel(&mut self) {
        self.dirty.clear();
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::FlushScheduler;
    use std::time::{Duration, Instant};

    #[test]
    fn rapid_marks_collapse_into_one_flush() {
        let start = Instant::now();
        let mut scheduler = FlushScheduler::new(Duration::from_millis(1000));
        for step in 0..5u64 {
            scheduler.mark_dirty("a", start + Duration::from_millis(step * 200));
        }
        scheduler.mark_dirty("b", start + Duration::from_millis(900));

        assert!(!scheduler.is_due(start + Duration::from_millis(1500)));
        assert_eq!(scheduler.take_due(start + Duration::from_millis(1899)), None);

        let due = scheduler
            .take_due(start + Duration::from_millis(1900))
            .expect("flush should be due");
        assert_eq!(due, vec!["a".to_string(), "b".to_string()]);
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.deadline(), None);
    }

    #[test]
    fn forgetting_last_id_clears_deadline() {
        let now = Instant::now();
        let mut scheduler = FlushScheduler::default();
        scheduler.mark_dirty("a", now);
        scheduler.forget("a");
        assert_eq!(scheduler.deadline(), None);
        assert!(!scheduler.is_due(now + Duration::from_secs(10)));
    }

    #[test]
    fn mark_all_dirty_with_nothing_new_keeps_idle() {
        let now = Instant::now();
        let mut scheduler = FlushScheduler::default();
        scheduler.mark_all_dirty(Vec::<String>::new(), now);
        assert_eq!(scheduler.deadline(), None);

        scheduler.mark_all_dirty(vec!["x".to_string(), "y".to_string()], now);
        assert!(scheduler.is_pending());
        scheduler.cancel();
        assert_eq!(scheduler.take_all(), Vec::<String>::new());
        assert!(!scheduler.is_pending());
    }
}

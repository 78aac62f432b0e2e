//! Deferred tasks counted down by the frame loop.
//!
//! Nothing in the core blocks. "Wait N seconds, then do X" is a
//! [`DeferredTask`] with a countdown; [`Scheduler::tick`] returns the tasks
//! that came due, earliest first, ties in scheduling order.

use serde::{Deserialize, Serialize};

use crate::output::ResetReason;

/// Work the orchestrator performs later.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeferredTask {
    /// Release every frozen actor at the end of a resolution's grace window.
    UnfreezeAll,
    /// Shuffle the board and send everyone back to their anchors.
    ResetBoard {
        /// What triggered the reset.
        reason: ResetReason,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
struct Scheduled {
    remaining: f32,
    sequence: u64,
    task: DeferredTask,
}

/// Countdown queue of [`DeferredTask`]s.
///
/// # Example
///
/// ```
/// use roomswap_core::game::{DeferredTask, Scheduler};
///
/// let mut scheduler = Scheduler::new();
/// scheduler.schedule(3.0, DeferredTask::UnfreezeAll);
/// assert!(scheduler.tick(2.0).is_empty());
/// assert_eq!(scheduler.tick(1.0), vec![DeferredTask::UnfreezeAll]);
/// assert!(scheduler.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scheduler {
    next_sequence: u64,
    pending: Vec<Scheduled>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` after `delay` seconds. A non-positive delay fires on the
    /// next tick.
    pub fn schedule(&mut self, delay: f32, task: DeferredTask) {
        self.pending.push(Scheduled {
            remaining: delay.max(0.0),
            sequence: self.next_sequence,
            task,
        });
        self.next_sequence += 1;
    }

    /// Drops every scheduled reset, whatever its reason.
    pub fn cancel_resets(&mut self) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|s| !matches!(s.task, DeferredTask::ResetBoard { .. }));
        before - self.pending.len()
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Seconds until the earliest scheduled reset fires.
    #[must_use]
    pub fn reset_countdown(&self) -> Option<f32> {
        self.pending
            .iter()
            .filter(|s| matches!(s.task, DeferredTask::ResetBoard { .. }))
            .map(|s| s.remaining)
            .reduce(f32::min)
    }

    /// Number of scheduled tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Counts every task down by `dt` and returns the ones that came due.
    pub fn tick(&mut self, dt: f32) -> Vec<DeferredTask> {
        for scheduled in &mut self.pending {
            scheduled.remaining -= dt;
        }
        let mut due: Vec<Scheduled> = Vec::new();
        self.pending.retain(|s| {
            if s.remaining <= 0.0 {
                due.push(*s);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| {
            a.remaining
                .total_cmp(&b.remaining)
                .then(a.sequence.cmp(&b.sequence))
        });
        due.into_iter().map(|s| s.task).collect()
    }
}

//! Deferred callbacks drained on the render thread.
//!
//! Components that need "run this later" (the settle redraw after an
//! animation, the idle redraw timer) talk to a [`Scheduler`]. The engine
//! owns a [`DeferredQueue`] and drains due tasks from its frame tick, so
//! callbacks always run on the thread that owns the GPU context.

use web_time::{Duration, Instant};

/// Work that can be deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeferredTask {
    /// One full-quality redraw after a restore-view animation finishes.
    SettleRedraw,
    /// Periodic redraw that keeps the drawable alive while idle.
    InactivityRedraw,
}

/// "Schedule callback after delay" capability.
///
/// At most one pending entry exists per task; scheduling a task that is
/// already pending replaces it.
pub trait Scheduler {
    /// Run `task` once, `delay` after `now`.
    fn schedule(&mut self, task: DeferredTask, now: Instant, delay: Duration);

    /// Run `task` every `period`, first at `now + period`.
    fn schedule_repeating(
        &mut self,
        task: DeferredTask,
        now: Instant,
        period: Duration,
    );

    /// Drop a pending task. Returns `true` if one was pending.
    fn cancel(&mut self, task: DeferredTask) -> bool;

    /// Whether `task` is pending.
    fn is_pending(&self, task: DeferredTask) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    task: DeferredTask,
    due: Instant,
    period: Option<Duration>,
}

/// Single-threaded timer queue.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    entries: Vec<Entry>,
}

impl DeferredQueue {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest due time, if anything is pending. Hosts use this to decide
    /// how long the event loop may sleep.
    #[must_use]
    pub fn next_due(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Remove and return every task due at or before `now`, in due order.
    ///
    /// Repeating tasks are re-armed one period after `now` (missed periods
    /// are coalesced into a single firing).
    pub fn drain_due(&mut self, now: Instant) -> Vec<DeferredTask> {
        let mut due: Vec<Entry> = Vec::new();
        self.entries.retain(|entry| {
            if entry.due <= now {
                due.push(*entry);
                false
            } else {
                true
            }
        });
        due.sort_by_key(|e| e.due);

        for entry in &due {
            if let Some(period) = entry.period {
                self.entries.push(Entry {
                    task: entry.task,
                    due: now + period,
                    period: Some(period),
                });
            }
        }

        due.into_iter().map(|e| e.task).collect()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn insert(&mut self, entry: Entry) {
        let _ = self.cancel(entry.task);
        self.entries.push(entry);
    }
}

impl Scheduler for DeferredQueue {
    fn schedule(&mut self, task: DeferredTask, now: Instant, delay: Duration) {
        self.insert(Entry {
            task,
            due: now + delay,
            period: None,
        });
    }

    fn schedule_repeating(
        &mut self,
        task: DeferredTask,
        now: Instant,
        period: Duration,
    ) {
        self.insert(Entry {
            task,
            due: now + period,
            period: Some(period),
        });
    }

    fn cancel(&mut self, task: DeferredTask) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.task != task);
        self.entries.len() != before
    }

    fn is_pending(&self, task: DeferredTask) -> bool {
        self.entries.iter().any(|e| e.task == task)
    }
}

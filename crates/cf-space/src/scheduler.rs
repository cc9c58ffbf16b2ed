//! Periodic task registration for the dispatch loop.
//!
//! Tasks run on the caller's thread from [`Scheduler::run_pending`], so they
//! are serialized with every other request the loop handles. A task is first
//! due one period after registration; a loop that falls behind skips the
//! missed periods instead of running a burst of catch-up calls.

use std::fmt;
use std::time::{Duration, Instant};

use crate::status::StatusCode;

/// Identifier returned by [`Scheduler::register_periodic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

type Callback = Box<dyn FnMut() + Send>;

struct PeriodicTask {
    id: TaskId,
    period: Duration,
    next_due: Instant,
    callback: Callback,
}

/// Fixed-period task table.
#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<PeriodicTask>,
    next_id: u64,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` to run every `period`, first at `now + period`.
    pub fn register_periodic<F>(
        &mut self,
        period: Duration,
        now: Instant,
        callback: F,
    ) -> Result<TaskId, StatusCode>
    where
        F: FnMut() + Send + 'static,
    {
        if period.is_zero() {
            return Err(StatusCode::BAD_INVALID_ARGUMENT);
        }
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(PeriodicTask {
            id,
            period,
            next_due: now + period,
            callback: Box::new(callback),
        });
        Ok(id)
    }

    /// Remove a task. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Run every task due at `now`; returns how many ran.
    pub fn run_pending(&mut self, now: Instant) -> usize {
        let mut ran = 0;
        for task in &mut self.tasks {
            if task.next_due > now {
                continue;
            }
            (task.callback)();
            ran += 1;
            task.next_due += task.period;
            if task.next_due <= now {
                task.next_due = now + task.period;
            }
        }
        ran
    }

    /// Earliest instant at which some task becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.iter().map(|t| t.next_due).min()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Cooperative FIFO scheduler.
//!
//! Owns the task queue and the drain loop. Nothing runs until the host
//! calls `run_once` or `run_until_idle`; tasks scheduled during a drain
//! are appended and run in the same drain.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::queue::TaskQueue;
use crate::task::{Handle, Schedule, Task};

/// Counters for one drain, or cumulative via [`Scheduler::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Tasks popped and run (including ones that panicked).
    pub executed: usize,
    /// Tasks that panicked.
    pub panicked: usize,
}

impl RunStats {
    fn absorb(&mut self, other: RunStats) {
        self.executed += other.executed;
        self.panicked += other.panicked;
    }
}

/// State reachable from every [`Handle`].
struct Shared {
    queue: TaskQueue,
    scheduled: Cell<u64>,
}

impl Schedule for Shared {
    fn schedule(&self, task: Task) {
        self.scheduled.set(self.scheduled.get() + 1);
        self.queue.push(task);
    }
}

pub struct Scheduler {
    shared: Rc<Shared>,
    config: SchedulerConfig,
    totals: Cell<RunStats>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                queue: TaskQueue::with_capacity(config.initial_capacity),
                scheduled: Cell::new(0),
            }),
            config,
            totals: Cell::new(RunStats::default()),
        }
    }

    /// Handle for futures and other producers of deferred work.
    pub fn handle(&self) -> Handle {
        Handle::from_schedule(self.shared.clone())
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn pending_tasks(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.shared.queue.is_empty()
    }

    /// Total tasks ever scheduled through any handle.
    pub fn scheduled_total(&self) -> u64 {
        self.shared.scheduled.get()
    }

    /// Cumulative counters across every drain.
    pub fn stats(&self) -> RunStats {
        self.totals.get()
    }

    /// Run the task at the front of the queue, if any.
    ///
    /// Returns `Ok(false)` when the queue was empty.
    pub fn run_once(&self) -> Result<bool, SchedulerError> {
        let Some(task) = self.shared.queue.pop() else {
            return Ok(false);
        };
        let mut stats = RunStats {
            executed: 1,
            panicked: 0,
        };
        let outcome = self.run_task(task, &mut stats);
        self.record(stats);
        outcome.map(|()| true)
    }

    /// Drain the queue, including tasks scheduled while draining.
    pub fn run_until_idle(&self) -> Result<RunStats, SchedulerError> {
        let mut stats = RunStats::default();

        loop {
            if let Some(limit) = self.config.step_limit {
                if stats.executed >= limit && !self.shared.queue.is_empty() {
                    let remaining = self.shared.queue.len();
                    tracing::warn!(executed = stats.executed, remaining, "scheduler step limit reached");
                    self.record(stats);
                    return Err(SchedulerError::StepLimitExceeded {
                        executed: stats.executed,
                        remaining,
                    });
                }
            }

            let Some(task) = self.shared.queue.pop() else {
                break;
            };
            stats.executed += 1;
            if let Err(err) = self.run_task(task, &mut stats) {
                self.record(stats);
                return Err(err);
            }
        }

        tracing::debug!(
            executed = stats.executed,
            panicked = stats.panicked,
            "scheduler idle"
        );
        self.record(stats);
        Ok(stats)
    }

    /// Drop queued tasks without running them. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        self.shared.queue.clear()
    }

    fn run_task(&self, task: Task, stats: &mut RunStats) -> Result<(), SchedulerError> {
        match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(()) => Ok(()),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                stats.panicked += 1;
                tracing::error!(%message, "deferred task panicked");
                if self.config.contain_panics {
                    Ok(())
                } else {
                    Err(SchedulerError::TaskPanicked { message })
                }
            }
        }
    }

    fn record(&self, stats: RunStats) {
        let mut totals = self.totals.get();
        totals.absorb(stats);
        self.totals.set(totals);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Queued tasks capture futures, futures capture handles: clearing
        // breaks the Rc cycle back to `shared`.
        let dropped = self.shared.queue.clear();
        if dropped > 0 {
            tracing::debug!(dropped, "scheduler dropped with queued tasks");
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending_tasks())
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

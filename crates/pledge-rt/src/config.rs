// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scheduler configuration.

/// Scheduler tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Queue slots reserved up front.
    pub initial_capacity: usize,
    /// Max tasks a single `run_until_idle` may execute. `None` = unbounded.
    pub step_limit: Option<usize>,
    /// Keep draining after a task panics. When false the drain stops at
    /// the panicking task and reports it.
    pub contain_panics: bool,
}

impl SchedulerConfig {
    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn with_contain_panics(mut self, contain: bool) -> Self {
        self.contain_panics = contain;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            step_limit: None,
            contain_panics: true,
        }
    }
}

// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scheduler errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The drain ran `executed` tasks and the queue still wasn't empty.
    #[error("step limit reached after {executed} tasks ({remaining} still queued)")]
    StepLimitExceeded { executed: usize, remaining: usize },

    /// A task panicked and the scheduler was configured to stop on panics.
    #[error("task panicked: {message}")]
    TaskPanicked { message: String },
}

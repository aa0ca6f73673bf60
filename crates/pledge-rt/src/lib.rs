// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Deferred-task runtime for pledge futures.
//!
//! One logical thread, no parallelism. Work is a queue of boxed closures
//! run strictly after the current call stack unwinds, in FIFO order of
//! enqueue. Futures only ever see a [`Handle`]; anything that implements
//! [`Schedule`] can stand in for the built-in [`Scheduler`].
//!
//! Components:
//! - `task`: `Task`, the `Schedule` contract, cloneable `Handle`
//! - `queue`: FIFO task queue
//! - `scheduler`: drain loop, panic containment, run statistics
//! - `config`: scheduler tuning knobs
//! - `error`: drain failures

pub mod config;
pub mod error;
pub mod queue;
pub mod scheduler;
pub mod task;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use scheduler::{RunStats, Scheduler};
pub use task::{Handle, Schedule, Task};

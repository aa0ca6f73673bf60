// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Single-threaded deferred values.
//!
//! A [`Future`] eventually holds exactly one of a value or a failure
//! reason. Reactions registered with `then`, `catch` or `finally` always
//! run later, on the [`Scheduler`]'s queue, and each returns a new
//! future. Resolving a future with another future makes it adopt that
//! future's outcome. The combinators in [`combinators`] fan several
//! futures into one.
//!
//! ```
//! use pledge::{Future, Outcome, Scheduler};
//!
//! let sched = Scheduler::new();
//! let f: Future<i32, String> = Future::new(&sched.handle(), |resolve, _| resolve.fulfill(3));
//! let g = f.then(|x| Ok(x * 4));
//! sched.run_until_idle().unwrap();
//! assert_eq!(g.outcome(), Some(Outcome::Fulfilled { value: 12 }));
//! ```
//!
//! Components:
//! - `future`: `Future` handle, reactions, observation
//! - `settle`: state machine core, `Resolve`/`Reject`, adoption
//! - `state`: `State` and `Outcome`
//! - `combinators`: `resolved`, `rejected`, `all`, `all_settled`, `race`, `any`
//! - `error`: `AggregateError`

pub mod combinators;
pub mod error;
pub mod future;
pub mod settle;
pub mod state;

pub use combinators::{all, all_settled, any, race, rejected, resolved};
pub use error::AggregateError;
pub use future::Future;
pub use settle::{IntoResolution, Reject, Resolution, Resolve};
pub use state::{Outcome, State};

pub use pledge_rt::{Handle, RunStats, Schedule, Scheduler, SchedulerConfig, SchedulerError};

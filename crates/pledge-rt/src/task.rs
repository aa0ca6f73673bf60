// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Deferred tasks and the scheduling contract.

use std::fmt;
use std::rc::Rc;

/// A unit of deferred work. Runs at most once.
pub type Task = Box<dyn FnOnce() + 'static>;

/// Enqueue-for-later-FIFO-execution.
///
/// Implementors must run every scheduled task exactly once, after the
/// caller of `schedule` has returned, and in the order tasks were
/// scheduled. A host event loop, a timer wheel or the in-crate
/// [`Scheduler`](crate::Scheduler) all satisfy this.
pub trait Schedule {
    fn schedule(&self, task: Task);
}

/// Cloneable reference to a scheduler.
///
/// This is what futures hold onto. Cloning is a refcount bump.
#[derive(Clone)]
pub struct Handle {
    inner: Rc<dyn Schedule>,
}

impl Handle {
    /// Wrap any scheduler implementation.
    pub fn from_schedule<S: Schedule + 'static>(schedule: Rc<S>) -> Self {
        Self { inner: schedule }
    }

    /// Defer `f` until the current synchronous work has finished.
    pub fn defer<F>(&self, f: F)
    where
        F: FnOnce() + 'static,
    {
        self.inner.schedule(Box::new(f));
    }

    /// Whether two handles point at the same scheduler.
    pub fn same_scheduler(&self, other: &Handle) -> bool {
        // Data pointers only; vtable pointers can differ across codegen units.
        Rc::as_ptr(&self.inner) as *const () == Rc::as_ptr(&other.inner) as *const ()
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("scheduler", &Rc::as_ptr(&self.inner))
            .finish()
    }
}

// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The `Future` handle: construction, reactions, observation.
//!
//! A `Future` is a shared reference to one write-once state machine.
//! Cloning it gives another view of the same future; `then`, `catch` and
//! `finally` give a new one. Handlers never run inside the call that
//! registers them. They are always deferred through the scheduler, so
//! the caller's following statements run first whether or not the future
//! had already settled.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use pledge_rt::Handle;

use crate::settle::{Core, IntoResolution, Reject, Resolution, Resolve};
use crate::state::{Outcome, State};

/// A value of type `T` or a failure of type `E`, available later.
pub struct Future<T, E> {
    pub(crate) core: Rc<Core<T, E>>,
}

impl<T, E> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Create a future whose setup routine runs on the scheduler.
    ///
    /// `setup` receives the fulfillment and rejection capabilities. It is
    /// never called inline.
    pub fn new<S>(handle: &Handle, setup: S) -> Self
    where
        S: FnOnce(Resolve<T, E>, Reject<T, E>) + 'static,
    {
        Self::try_new(handle, move |resolve, reject| {
            setup(resolve, reject);
            Ok(())
        })
    }

    /// Like [`Future::new`], but an `Err` from `setup` rejects the future.
    ///
    /// A settle that happened before the error wins.
    pub fn try_new<S>(handle: &Handle, setup: S) -> Self
    where
        S: FnOnce(Resolve<T, E>, Reject<T, E>) -> Result<(), E> + 'static,
    {
        let (future, resolve, reject) = Self::pending(handle);
        let id = future.id();
        handle.defer(move || {
            let on_error = reject.clone();
            if let Err(reason) = setup(resolve, reject) {
                tracing::trace!(future = id, "setup failed");
                on_error.reject(reason);
            }
        });
        future
    }

    /// A pending future and its two capabilities, with no setup routine.
    pub fn pending(handle: &Handle) -> (Self, Resolve<T, E>, Reject<T, E>) {
        let core = Core::new(handle);
        let resolve = Resolve::new(Rc::clone(&core));
        let reject = Reject::new(Rc::clone(&core));
        (Self { core }, resolve, reject)
    }

    /// A future resolved with `r` right away. A `Future` is adopted.
    pub fn resolve<R>(handle: &Handle, r: R) -> Self
    where
        R: IntoResolution<T, E>,
    {
        let (future, resolve, _) = Self::pending(handle);
        resolve.resolve(r);
        future
    }

    /// React to fulfillment. A rejection passes through unchanged.
    pub fn then<U, F, R>(&self, on_fulfilled: F) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> R + 'static,
        R: IntoResolution<U, E>,
    {
        self.react(
            move |value| on_fulfilled(value).into_resolution(),
            |reason| Err(reason),
        )
    }

    /// React to both outcomes. Returning `Ok` from `on_rejected` recovers.
    pub fn then_with<U, F, G, R, S>(&self, on_fulfilled: F, on_rejected: G) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> R + 'static,
        G: FnOnce(E) -> S + 'static,
        R: IntoResolution<U, E>,
        S: IntoResolution<U, E>,
    {
        self.react(
            move |value| on_fulfilled(value).into_resolution(),
            move |reason| on_rejected(reason).into_resolution(),
        )
    }

    /// React to rejection. A fulfillment passes through unchanged.
    pub fn catch<G, S>(&self, on_rejected: G) -> Future<T, E>
    where
        G: FnOnce(E) -> S + 'static,
        S: IntoResolution<T, E>,
    {
        self.react(
            |value| Ok(Resolution::Value(value)),
            move |reason| on_rejected(reason).into_resolution(),
        )
    }

    /// Run `on_settled` on either outcome, then pass the outcome on as is.
    pub fn finally<F>(&self, on_settled: F) -> Future<T, E>
    where
        F: FnOnce() + 'static,
    {
        // Only one of the two reactions ever runs.
        let handler = Rc::new(Cell::new(Some(on_settled)));
        let on_reason = Rc::clone(&handler);
        self.react(
            move |value| {
                if let Some(f) = handler.take() {
                    f();
                }
                Ok(Resolution::Value(value))
            },
            move |reason| {
                if let Some(f) = on_reason.take() {
                    f();
                }
                Err(reason)
            },
        )
    }

    /// Clone of the outcome, once settled.
    pub fn outcome(&self) -> Option<Outcome<T, E>> {
        self.core.outcome()
    }

    /// Raw reaction pair, no downstream future. Used by combinators.
    pub(crate) fn subscribe<F, R>(&self, on_fulfill: F, on_reject: R)
    where
        F: FnOnce(T) + 'static,
        R: FnOnce(E) + 'static,
    {
        self.core.subscribe(on_fulfill, on_reject);
    }

    fn react<U, F, G>(&self, on_fulfilled: F, on_rejected: G) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Result<Resolution<U, E>, E> + 'static,
        G: FnOnce(E) -> Result<Resolution<U, E>, E> + 'static,
    {
        let (next, resolve, _) = Future::pending(self.handle());
        tracing::trace!(future = self.id(), next = next.id(), "reaction registered");
        let on_reason = resolve.clone();
        self.core.subscribe(
            move |value| resolve.complete(on_fulfilled(value)),
            move |reason| on_reason.complete(on_rejected(reason)),
        );
        next
    }
}

impl<T, E> Future<T, E> {
    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.core.state()
    }

    /// Not settled yet. A future that is adopting another is still pending.
    pub fn is_pending(&self) -> bool {
        self.state() == State::Pending
    }

    /// Process-unique id, used in trace events.
    pub fn id(&self) -> u64 {
        self.core.id()
    }

    /// Scheduler this future defers its reactions to.
    pub fn handle(&self) -> &Handle {
        self.core.handle()
    }
}

impl<T, E> Clone for Future<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T, E> fmt::Debug for Future<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

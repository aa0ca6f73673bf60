// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Settle and adoption logic.
//!
//! `Core` is the state machine behind every `Future`: one outcome slot,
//! two reaction queues, and an adoption latch. `Resolve` and `Reject` are
//! the capability handles given to setup routines; both are thin `Rc`s
//! onto the same core.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use pledge_rt::Handle;

use crate::future::Future;
use crate::state::{Outcome, State};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Reaction lists of dropped cores, waiting to be freed.
    static PARKED: RefCell<Vec<Box<dyn Any>>> = const { RefCell::new(Vec::new()) };
    static DRAINING: Cell<bool> = const { Cell::new(false) };
}

type OnFulfill<T> = Box<dyn FnOnce(T)>;
type OnReject<E> = Box<dyn FnOnce(E)>;

/// Who is trying to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    /// A capability handle held by user code or a combinator.
    Direct,
    /// The inner future this one adopted.
    Adopted,
}

struct Slot<T, E> {
    outcome: Option<Outcome<T, E>>,
    /// Resolved with another future; only that future may settle us now.
    adopting: bool,
    on_fulfill: Vec<OnFulfill<T>>,
    on_reject: Vec<OnReject<E>>,
}

pub(crate) struct Core<T, E> {
    id: u64,
    handle: Handle,
    slot: RefCell<Slot<T, E>>,
    /// Hands unrun reactions to `park` on drop.
    release: fn(&mut Slot<T, E>),
}

impl<T, E> Drop for Core<T, E> {
    fn drop(&mut self) {
        (self.release)(self.slot.get_mut());
    }
}

/// Moves a dropped core's reactions onto the parked list.
///
/// Each reaction may own the next future in a chain, so freeing them
/// inline would recurse once per link.
fn release_reactions<T: 'static, E: 'static>(slot: &mut Slot<T, E>) {
    if slot.on_fulfill.is_empty() && slot.on_reject.is_empty() {
        return;
    }
    let reactions = (mem::take(&mut slot.on_fulfill), mem::take(&mut slot.on_reject));
    park(Box::new(reactions));
}

/// Frees `garbage`. Nested calls only push; the outermost call drains the
/// list in a loop, so chain depth never reaches the stack.
fn park(garbage: Box<dyn Any>) {
    // During thread teardown the list is gone; drop inline.
    if PARKED.try_with(|parked| parked.borrow_mut().push(garbage)).is_err() {
        return;
    }
    if DRAINING.with(|draining| draining.replace(true)) {
        return;
    }
    while let Some(next) = PARKED.with(|parked| parked.borrow_mut().pop()) {
        drop(next);
    }
    DRAINING.with(|draining| draining.set(false));
}

impl<T, E> Core<T, E> {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn handle(&self) -> &Handle {
        &self.handle
    }

    pub(crate) fn state(&self) -> State {
        match &self.slot.borrow().outcome {
            None => State::Pending,
            Some(outcome) => outcome.state(),
        }
    }
}

impl<T, E> Core<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    pub(crate) fn new(handle: &Handle) -> Rc<Self> {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(future = id, "future created");
        Rc::new(Self {
            id,
            handle: handle.clone(),
            slot: RefCell::new(Slot {
                outcome: None,
                adopting: false,
                on_fulfill: Vec::new(),
                on_reject: Vec::new(),
            }),
            release: release_reactions::<T, E>,
        })
    }

    pub(crate) fn outcome(&self) -> Option<Outcome<T, E>> {
        self.slot.borrow().outcome.clone()
    }

    /// Register a reaction pair.
    ///
    /// Pending: queued. Settled: the matching reaction is scheduled right
    /// away. Either way it never runs inside this call.
    pub(crate) fn subscribe<F, R>(&self, on_fulfill: F, on_reject: R)
    where
        F: FnOnce(T) + 'static,
        R: FnOnce(E) + 'static,
    {
        {
            let mut slot = self.slot.borrow_mut();
            if slot.outcome.is_none() {
                slot.on_fulfill.push(Box::new(on_fulfill));
                slot.on_reject.push(Box::new(on_reject));
                return;
            }
        }
        let Some(settled) = self.outcome() else {
            return;
        };

        tracing::trace!(future = self.id, "reaction on settled future scheduled");
        match settled {
            Outcome::Fulfilled { value } => self.handle.defer(move || on_fulfill(value)),
            Outcome::Rejected { reason } => self.handle.defer(move || on_reject(reason)),
        }
    }

    fn settle(&self, outcome: Outcome<T, E>, source: Source) {
        if !self.accepts(source) {
            tracing::trace!(future = self.id, "settle ignored");
            return;
        }
        // User `Clone` runs with no borrow held.
        let stored = outcome.clone();
        let (on_fulfill, on_reject) = {
            let mut slot = self.slot.borrow_mut();
            if slot.outcome.is_some() || (slot.adopting && source == Source::Direct) {
                return;
            }
            slot.outcome = Some(stored);
            (
                mem::take(&mut slot.on_fulfill),
                mem::take(&mut slot.on_reject),
            )
        };

        tracing::trace!(
            future = self.id,
            state = %outcome.state(),
            reactions = on_fulfill.len(),
            "future settled"
        );

        // The queue that doesn't match is dropped unrun.
        match outcome {
            Outcome::Fulfilled { value } => {
                drop(on_reject);
                for reaction in on_fulfill {
                    let value = value.clone();
                    self.handle.defer(move || reaction(value));
                }
            }
            Outcome::Rejected { reason } => {
                drop(on_fulfill);
                for reaction in on_reject {
                    let reason = reason.clone();
                    self.handle.defer(move || reaction(reason));
                }
            }
        }
    }

    fn accepts(&self, source: Source) -> bool {
        let slot = self.slot.borrow();
        slot.outcome.is_none() && !(slot.adopting && source == Source::Direct)
    }

    fn adopt(self: &Rc<Self>, inner: &Future<T, E>) {
        {
            let mut slot = self.slot.borrow_mut();
            if slot.outcome.is_some() || slot.adopting {
                tracing::trace!(future = self.id, "adoption ignored");
                return;
            }
            slot.adopting = true;
        }

        if Rc::ptr_eq(self, &inner.core) {
            tracing::warn!(future = self.id, "future resolved with itself; it will never settle");
            return;
        }

        // Longer cycles (A adopts B, B adopts A) are not detected: both stay
        // pending and each holds the other, so neither is ever freed.
        tracing::trace!(future = self.id, inner = inner.id(), "adopting inner future");
        let on_value = Rc::clone(self);
        let on_reason = Rc::clone(self);
        inner.core.subscribe(
            move |value| on_value.settle(Outcome::Fulfilled { value }, Source::Adopted),
            move |reason| on_reason.settle(Outcome::Rejected { reason }, Source::Adopted),
        );
    }
}

/// What a future can be resolved with: a plain value, or another future
/// whose eventual outcome it adopts.
pub enum Resolution<T, E> {
    Value(T),
    Adopt(Future<T, E>),
}

/// Anything a reaction handler may return.
///
/// `Err` rejects the downstream future, `Ok` fulfills it, and a
/// `Future` is adopted.
pub trait IntoResolution<T, E> {
    fn into_resolution(self) -> Result<Resolution<T, E>, E>;
}

impl<T, E> IntoResolution<T, E> for Result<T, E> {
    fn into_resolution(self) -> Result<Resolution<T, E>, E> {
        self.map(Resolution::Value)
    }
}

impl<T, E> IntoResolution<T, E> for Future<T, E> {
    fn into_resolution(self) -> Result<Resolution<T, E>, E> {
        Ok(Resolution::Adopt(self))
    }
}

impl<T, E> IntoResolution<T, E> for Resolution<T, E> {
    fn into_resolution(self) -> Result<Resolution<T, E>, E> {
        Ok(self)
    }
}

/// Fulfillment capability of one future.
pub struct Resolve<T, E> {
    core: Rc<Core<T, E>>,
}

impl<T, E> Resolve<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    pub(crate) fn new(core: Rc<Core<T, E>>) -> Self {
        Self { core }
    }

    /// Fulfill with a plain value. No-op once settled or adopting.
    pub fn fulfill(&self, value: T) {
        self.core.settle(Outcome::Fulfilled { value }, Source::Direct);
    }

    /// Mirror `inner`'s eventual outcome. No-op once settled or adopting.
    pub fn adopt(&self, inner: Future<T, E>) {
        self.core.adopt(&inner);
    }

    /// Fulfill, adopt or reject depending on what `r` is.
    pub fn resolve<R>(&self, r: R)
    where
        R: IntoResolution<T, E>,
    {
        self.complete(r.into_resolution());
    }

    pub(crate) fn complete(&self, resolution: Result<Resolution<T, E>, E>) {
        match resolution {
            Ok(Resolution::Value(value)) => self.fulfill(value),
            Ok(Resolution::Adopt(inner)) => self.adopt(inner),
            Err(reason) => self.core.settle(Outcome::Rejected { reason }, Source::Direct),
        }
    }
}

impl<T, E> Clone for Resolve<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

/// Rejection capability of one future.
pub struct Reject<T, E> {
    core: Rc<Core<T, E>>,
}

impl<T, E> Reject<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    pub(crate) fn new(core: Rc<Core<T, E>>) -> Self {
        Self { core }
    }

    /// Reject with `reason`. No-op once settled or adopting.
    pub fn reject(&self, reason: E) {
        self.core.settle(Outcome::Rejected { reason }, Source::Direct);
    }
}

impl<T, E> Clone for Reject<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

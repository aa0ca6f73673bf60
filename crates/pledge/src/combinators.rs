// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Constructors and fan-in combinators.
//!
//! Each combinator returns one future settled through its capabilities
//! by raw subscriptions on the inputs. Inputs that settle after the
//! result has settled are ignored by the settle-once rule.

use std::cell::RefCell;
use std::rc::Rc;

use pledge_rt::Handle;

use crate::error::AggregateError;
use crate::future::Future;
use crate::state::Outcome;

/// Per-index results, filled in as inputs settle.
struct Gather<V> {
    slots: Vec<Option<V>>,
    remaining: usize,
}

impl<V> Gather<V> {
    fn new(len: usize) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            slots: (0..len).map(|_| None).collect(),
            remaining: len,
        }))
    }

    /// Store slot `index`. Returns every slot, in order, once all are in.
    fn record(&mut self, index: usize, value: V) -> Option<Vec<V>> {
        if self.slots[index].replace(value).is_none() {
            self.remaining -= 1;
        }
        if self.remaining == 0 {
            Some(self.slots.drain(..).flatten().collect())
        } else {
            None
        }
    }
}

/// A future already fulfilled with `value`.
pub fn resolved<T, E>(handle: &Handle, value: T) -> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let (future, resolve, _) = Future::pending(handle);
    resolve.fulfill(value);
    future
}

/// A future already rejected with `reason`.
pub fn rejected<T, E>(handle: &Handle, reason: E) -> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    let (future, _, reject) = Future::pending(handle);
    reject.reject(reason);
    future
}

/// Fulfills with every value in input order, or rejects with the first
/// rejection. Empty input fulfills with an empty `Vec`.
pub fn all<T, E, I>(handle: &Handle, futures: I) -> Future<Vec<T>, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = Future<T, E>>,
{
    let futures: Vec<_> = futures.into_iter().collect();
    let (result, resolve, reject) = Future::pending(handle);
    tracing::trace!(future = result.id(), inputs = futures.len(), "all");

    if futures.is_empty() {
        resolve.fulfill(Vec::new());
        return result;
    }

    let gather = Gather::new(futures.len());
    for (index, future) in futures.iter().enumerate() {
        let (gather, resolve, reject) = (gather.clone(), resolve.clone(), reject.clone());
        future.subscribe(
            move |value| {
                let done = gather.borrow_mut().record(index, value);
                if let Some(values) = done {
                    resolve.fulfill(values);
                }
            },
            move |reason| reject.reject(reason),
        );
    }
    result
}

/// Fulfills, once every input has settled, with one `Outcome` per input
/// in input order. Never rejects.
pub fn all_settled<T, E, I>(handle: &Handle, futures: I) -> Future<Vec<Outcome<T, E>>, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = Future<T, E>>,
{
    let futures: Vec<_> = futures.into_iter().collect();
    let (result, resolve, _) = Future::pending(handle);
    tracing::trace!(future = result.id(), inputs = futures.len(), "all_settled");

    if futures.is_empty() {
        resolve.fulfill(Vec::new());
        return result;
    }

    let gather = Gather::new(futures.len());
    for (index, future) in futures.iter().enumerate() {
        let (on_value, on_reason) = (gather.clone(), gather.clone());
        let (resolve, resolve_rejected) = (resolve.clone(), resolve.clone());
        future.subscribe(
            move |value| {
                let done = on_value.borrow_mut().record(index, Outcome::Fulfilled { value });
                if let Some(records) = done {
                    resolve.fulfill(records);
                }
            },
            move |reason| {
                let done = on_reason.borrow_mut().record(index, Outcome::Rejected { reason });
                if let Some(records) = done {
                    resolve_rejected.fulfill(records);
                }
            },
        );
    }
    result
}

/// Settles like whichever input settles first. Empty input never settles.
pub fn race<T, E, I>(handle: &Handle, futures: I) -> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = Future<T, E>>,
{
    let (result, resolve, reject) = Future::pending(handle);
    let mut inputs = 0usize;
    for future in futures {
        inputs += 1;
        let (resolve, reject) = (resolve.clone(), reject.clone());
        future.subscribe(move |value| resolve.fulfill(value), move |reason| reject.reject(reason));
    }
    tracing::trace!(future = result.id(), inputs, "race");
    result
}

/// Fulfills with the first fulfillment. If every input rejects, rejects
/// with all reasons in input order. Empty input rejects right away.
pub fn any<T, E, I>(handle: &Handle, futures: I) -> Future<T, AggregateError<E>>
where
    T: Clone + 'static,
    E: Clone + 'static,
    I: IntoIterator<Item = Future<T, E>>,
{
    let futures: Vec<_> = futures.into_iter().collect();
    let (result, resolve, reject) = Future::pending(handle);
    tracing::trace!(future = result.id(), inputs = futures.len(), "any");

    if futures.is_empty() {
        reject.reject(AggregateError::new(Vec::new()));
        return result;
    }

    let gather = Gather::new(futures.len());
    for (index, future) in futures.iter().enumerate() {
        let (gather, resolve, reject) = (gather.clone(), resolve.clone(), reject.clone());
        future.subscribe(
            move |value| resolve.fulfill(value),
            move |reason| {
                let done = gather.borrow_mut().record(index, reason);
                if let Some(errors) = done {
                    reject.reject(AggregateError::new(errors));
                }
            },
        );
    }
    result
}

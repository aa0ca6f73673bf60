// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Reaction ordering, fan-out and adoption through the public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pledge::{resolved, rejected, Future, Handle, Outcome, Resolution, Scheduler, State};

const DEFAULT_VALUE: &str = "DEFAULT";

fn build(handle: &Handle, value: &'static str, fail: bool) -> Future<&'static str, &'static str> {
    Future::new(handle, move |resolve, reject| {
        if fail {
            reject.reject(value);
        } else {
            resolve.fulfill(value);
        }
    })
}

#[test]
fn multiple_thens_each_see_the_value_once() {
    let sched = Scheduler::new();
    let main = build(&sched.handle(), DEFAULT_VALUE, false);
    let calls = Rc::new(RefCell::new(Vec::new()));

    let (c1, c2) = (calls.clone(), calls.clone());
    let a = main.then(move |v| {
        c1.borrow_mut().push(v);
        Ok(1)
    });
    let b = main.then(move |v| {
        c2.borrow_mut().push(v);
        Ok(2)
    });
    sched.run_until_idle().unwrap();

    assert_eq!(*calls.borrow(), vec![DEFAULT_VALUE, DEFAULT_VALUE]);
    assert_eq!(a.outcome(), Some(Outcome::Fulfilled { value: 1 }));
    assert_eq!(b.outcome(), Some(Outcome::Fulfilled { value: 2 }));
}

#[test]
fn multiple_catches_each_see_the_reason_once() {
    let sched = Scheduler::new();
    let main = build(&sched.handle(), DEFAULT_VALUE, true);
    let seen = Rc::new(Cell::new(0));

    for _ in 0..2 {
        let s = seen.clone();
        main.catch(move |e| {
            assert_eq!(e, DEFAULT_VALUE);
            s.set(s.get() + 1);
            Ok("recovered")
        });
    }
    sched.run_until_idle().unwrap();
    assert_eq!(seen.get(), 2);
}

#[test]
fn then_then_catch_skips_fulfillment_handler() {
    let sched = Scheduler::new();
    let on_success = Rc::new(Cell::new(0));
    let on_error = Rc::new(Cell::new(0));

    let (s, e) = (on_success.clone(), on_error.clone());
    let f = build(&sched.handle(), DEFAULT_VALUE, true)
        .then(move |v| {
            s.set(s.get() + 1);
            Ok(v)
        })
        .catch(move |reason| {
            e.set(e.get() + 1);
            Ok(reason)
        });
    sched.run_until_idle().unwrap();

    assert_eq!((on_success.get(), on_error.get()), (0, 1));
    assert_eq!(f.outcome(), Some(Outcome::Fulfilled { value: DEFAULT_VALUE }));
}

#[test]
fn reactions_fire_in_registration_order() {
    let sched = Scheduler::new();
    let handle = sched.handle();
    let order = Rc::new(RefCell::new(Vec::new()));

    let (pending, resolve, _) = Future::<i32, ()>::pending(&handle);
    let settled: Future<i32, ()> = resolved(&handle, 0);

    for f in [&pending, &settled] {
        for i in 0..3 {
            let o = order.clone();
            let tag = if f.is_pending() { "p" } else { "s" };
            f.then(move |_| {
                o.borrow_mut().push(format!("{tag}{i}"));
                Ok(())
            });
        }
    }
    resolve.fulfill(1);
    sched.run_until_idle().unwrap();

    assert_eq!(*order.borrow(), vec!["s0", "s1", "s2", "p0", "p1", "p2"]);
}

#[test]
fn timing_does_not_change_handler_order_relative_to_sync_code() {
    // Same observable order whether the future settled before or after
    // `then` was called.
    for settle_first in [true, false] {
        let sched = Scheduler::new();
        let (f, resolve, _) = Future::<i32, ()>::pending(&sched.handle());
        let log = Rc::new(RefCell::new(Vec::new()));

        if settle_first {
            resolve.fulfill(1);
        }
        let l = log.clone();
        f.then(move |_| {
            l.borrow_mut().push("handler");
            Ok(())
        });
        log.borrow_mut().push("sync");
        if !settle_first {
            resolve.fulfill(1);
        }
        sched.run_until_idle().unwrap();

        assert_eq!(*log.borrow(), vec!["sync", "handler"]);
    }
}

#[test]
fn two_level_adoption() {
    let sched = Scheduler::new();
    let handle = sched.handle();

    let (leaf, leaf_resolve, _) = Future::<i32, String>::pending(&handle);
    let (middle, middle_resolve, _) = Future::<i32, String>::pending(&handle);
    let (outer, outer_resolve, _) = Future::<i32, String>::pending(&handle);

    middle_resolve.adopt(leaf);
    outer_resolve.resolve(middle.clone());
    sched.run_until_idle().unwrap();
    assert_eq!(outer.state(), State::Pending);
    assert_eq!(middle.state(), State::Pending);

    leaf_resolve.fulfill(42);
    sched.run_until_idle().unwrap();
    assert_eq!(middle.outcome(), Some(Outcome::Fulfilled { value: 42 }));
    assert_eq!(outer.outcome(), Some(Outcome::Fulfilled { value: 42 }));
}

#[test]
fn adoption_mirrors_rejection() {
    let sched = Scheduler::new();
    let handle = sched.handle();
    let inner: Future<i32, String> = rejected(&handle, "inner failed".to_string());
    let outer = Future::resolve(&handle, Resolution::Adopt(inner));
    sched.run_until_idle().unwrap();
    assert_eq!(outer.outcome(), Some(Outcome::Rejected { reason: "inner failed".to_string() }));
}

#[test]
fn deep_adoption_chain() {
    let sched = Scheduler::new();
    let handle = sched.handle();

    let (leaf, leaf_resolve, _) = Future::<u32, ()>::pending(&handle);
    let mut head = leaf;
    for _ in 0..500 {
        head = Future::resolve(&handle, head);
    }
    leaf_resolve.fulfill(7);
    sched.run_until_idle().unwrap();
    assert_eq!(head.outcome(), Some(Outcome::Fulfilled { value: 7 }));
}

#[test]
fn handler_returning_future_chains() {
    let sched = Scheduler::new();
    let handle = sched.handle();
    let h = handle.clone();

    let f = build(&handle, "a", false)
        .then(move |v| {
            let h2 = h.clone();
            Future::new(&h, move |resolve, _| {
                resolve.resolve(build(&h2, if v == "a" { "b" } else { "?" }, false));
            })
        })
        .then(|v| Ok(v.len()));
    sched.run_until_idle().unwrap();
    assert_eq!(f.outcome(), Some(Outcome::Fulfilled { value: 1 }));
}

#[test]
fn finally_ignores_its_own_result_and_passes_outcome() {
    let sched = Scheduler::new();
    let handle = sched.handle();
    let ran = Rc::new(Cell::new(0));

    let r = ran.clone();
    let ok = build(&handle, DEFAULT_VALUE, false)
        .then(|v| Ok(v))
        .finally(move || r.set(r.get() + 1));
    let r = ran.clone();
    let err = build(&handle, DEFAULT_VALUE, true)
        .then(|v| Ok(v))
        .finally(move || r.set(r.get() + 1));
    sched.run_until_idle().unwrap();

    assert_eq!(ran.get(), 2);
    assert_eq!(ok.outcome(), Some(Outcome::Fulfilled { value: DEFAULT_VALUE }));
    assert_eq!(err.outcome(), Some(Outcome::Rejected { reason: DEFAULT_VALUE }));
}

#[test]
fn panicking_handler_leaves_downstream_pending() {
    let sched = Scheduler::new();
    let f: Future<i32, ()> = resolved(&sched.handle(), 1);
    let g = f.then(|_| -> Result<i32, ()> { panic!("handler bug") });
    let stats = sched.run_until_idle().unwrap();

    assert_eq!(stats.panicked, 1);
    assert!(g.is_pending());
}

#[test]
fn dropping_deep_pending_then_chain() {
    let sched = Scheduler::new();
    let (leaf, leaf_resolve, _) = Future::<u32, ()>::pending(&sched.handle());
    let mut head = leaf;
    for _ in 0..200_000 {
        head = head.then(|x| Ok(x));
    }
    drop(head);
    // The leaf's reactions own the whole chain.
    drop(leaf_resolve);
    assert!(sched.is_idle());
}

#[test]
fn dropping_deep_pending_adoption_chain() {
    let sched = Scheduler::new();
    let handle = sched.handle();
    let (leaf, leaf_resolve, _) = Future::<u32, ()>::pending(&handle);
    let mut head = leaf;
    for _ in 0..200_000 {
        head = Future::resolve(&handle, head);
    }
    drop(head);
    drop(leaf_resolve);
    assert!(sched.is_idle());
}

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use assert_call::{call, CallRecorder};

use crate::{core::Runtime, Computed, State};

#[test]
fn cached_between_reads() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let s = State::new(1);
    let s0 = s.clone();
    let c = Computed::new(move |sc| {
        call!("compute");
        s0.get(sc) * 2
    });

    assert_eq!(c.get(&mut rt.sc()), 2);
    assert_eq!(c.get(&mut rt.sc()), 2);
    cr.verify("compute");
}

#[test]
fn recomputes_after_change() {
    let mut rt = Runtime::new();
    let s = State::new(1);
    let s0 = s.clone();
    let c = Computed::new(move |sc| s0.get(sc) * 2);

    assert_eq!(c.get(&mut rt.sc()), 2);
    s.set(5, rt.ac());
    assert_eq!(c.get(&mut rt.sc()), 10);
}

#[test]
fn not_recomputed_until_read() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let s = State::new(1);
    let s0 = s.clone();
    let c = Computed::new(move |sc| {
        call!("compute");
        s0.get(sc) * 2
    });

    assert_eq!(c.get(&mut rt.sc()), 2);
    cr.verify("compute");

    s.set(5, rt.ac());
    cr.verify(());

    assert_eq!(c.get(&mut rt.sc()), 10);
    cr.verify("compute");
}

#[test]
fn nested() {
    let mut rt = Runtime::new();
    let s = State::new(1);
    let s0 = s.clone();
    let d1 = Computed::new(move |sc| s0.get(sc) + 1);
    let d1_ = d1.clone();
    let d2 = Computed::new(move |sc| d1_.get(sc) * 10);

    assert_eq!(d2.get(&mut rt.sc()), 20);

    s.set(2, rt.ac());
    assert_eq!(d2.get(&mut rt.sc()), 30);
}

#[test]
fn repeated_writes_without_reads() {
    let mut rt = Runtime::new();
    let s = State::new(1);
    let s0 = s.clone();
    let d1 = Computed::new(move |sc| s0.get(sc) + 1);
    let d1_ = d1.clone();
    let d2 = Computed::new(move |sc| d1_.get(sc) * 10);

    assert_eq!(d2.get(&mut rt.sc()), 20);

    s.set(2, rt.ac());
    s.set(3, rt.ac());
    assert_eq!(d2.get(&mut rt.sc()), 40);
}

#[test]
fn conditional_dependencies_retrack() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let cond = State::new(true);
    let a = State::new(1);
    let b = State::new(10);
    let (cond0, a0, b0) = (cond.clone(), a.clone(), b.clone());
    let c = Computed::new(move |sc| {
        call!("compute");
        if cond0.get(sc) {
            a0.get(sc)
        } else {
            b0.get(sc)
        }
    });

    assert_eq!(c.get(&mut rt.sc()), 1);
    cr.verify("compute");

    // not a dependency while the condition holds
    b.set(20, rt.ac());
    assert_eq!(c.get(&mut rt.sc()), 1);
    cr.verify(());

    cond.set(false, rt.ac());
    assert_eq!(c.get(&mut rt.sc()), 20);
    cr.verify("compute");

    // dropped from the dependency set by the last run
    a.set(2, rt.ac());
    assert_eq!(c.get(&mut rt.sc()), 20);
    cr.verify(());
}

#[test]
#[should_panic(expected = "cyclic dependency detected")]
fn cyclic_computation_panics() {
    let mut rt = Runtime::new();
    let this: Rc<RefCell<Option<Computed<i32>>>> = Rc::new(RefCell::new(None));
    let this0 = this.clone();
    let c = Computed::new(move |sc| this0.borrow().as_ref().unwrap().get(sc) + 1);
    *this.borrow_mut() = Some(c.clone());
    let _ = c.get(&mut rt.sc());
}

#[test]
fn failed_computation_retries_on_next_read() {
    let mut rt = Runtime::new();
    let fail = Rc::new(Cell::new(true));
    let s = State::new(2);
    let (fail0, s0) = (fail.clone(), s.clone());
    let c = Computed::new(move |sc| {
        assert!(!fail0.get(), "computation failure");
        s0.get(sc) * 2
    });

    let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| c.get(&mut rt.sc())));
    assert!(r.is_err());

    fail.set(false);
    assert_eq!(c.get(&mut rt.sc()), 4);

    // the retry re-established tracking
    s.set(3, rt.ac());
    assert_eq!(c.get(&mut rt.sc()), 6);
}

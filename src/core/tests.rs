use assert_call::{call, CallRecorder};

use crate::{core::Runtime, effect, State};

#[test]
#[should_panic(expected = "Only one `Runtime` can exist")]
fn second_runtime_on_thread_panics() {
    let _rt = Runtime::new();
    let _rt2 = Runtime::new();
}

#[test]
fn runtime_guard_cleared_after_drop() {
    {
        let _rt = Runtime::new();
    }
    let _rt = Runtime::new();
}

#[test]
fn untrack_suppresses_subscription() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let tracked = State::new(1);
    let untracked = State::new(10);
    let (t0, u0) = (tracked.clone(), untracked.clone());
    let _e = effect(
        move |sc| {
            let t = t0.get(sc);
            let u = sc.untrack(|sc| u0.get(sc));
            call!("{}", t + u);
        },
        &mut rt.uc(),
    );
    cr.verify("11");

    untracked.set(20, rt.ac());
    cr.verify(());

    tracked.set(2, rt.ac());
    cr.verify("22");
}

#[test]
fn tracking_resumes_after_untrack() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let a = State::new(1);
    let b = State::new(2);
    let (a0, b0) = (a.clone(), b.clone());
    let _e = effect(
        move |sc| {
            sc.untrack(|sc| a0.get(sc));
            call!("{}", b0.get(sc));
        },
        &mut rt.uc(),
    );
    cr.verify("2");

    // `b` was read after the untracked section ended, so it is tracked.
    b.set(3, rt.ac());
    cr.verify("3");
    a.set(9, rt.ac());
    cr.verify(());
}

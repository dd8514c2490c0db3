use assert_call::{call, CallRecorder};

use crate::{core::Runtime, Computed, Signal, State, ToSignal};

#[test]
fn new() {
    let mut rt = Runtime::new();

    let st = State::new(5);
    let st_ = st.clone();
    let s = Signal::new(move |sc| st_.get(sc));

    assert_eq!(s.get(&mut rt.sc()), 5);

    st.set(10, rt.ac());
    assert_eq!(s.get(&mut rt.sc()), 10);
}

#[test]
fn new_nested() {
    let mut rt = Runtime::new();

    let st = State::new(5);
    let st_ = st.clone();
    let s0 = Signal::new(move |sc| st_.get(sc));
    let s1 = Signal::new(move |sc| s0.get(sc));

    assert_eq!(s1.get(&mut rt.sc()), 5);

    st.set(10, rt.ac());
    assert_eq!(s1.get(&mut rt.sc()), 10);
}

#[test]
fn from_value() {
    let mut rt = Runtime::new();
    let s = Signal::from_value(5);
    assert_eq!(s.get(&mut rt.sc()), 5);
}

#[test]
fn map() {
    let mut rt = Runtime::new();
    let st = State::new((1, 'a'));
    let s = st.to_signal().map(|v| &v.0);

    assert_eq!(s.get(&mut rt.sc()), 1);

    st.set((2, 'b'), rt.ac());
    assert_eq!(s.get(&mut rt.sc()), 2);
}

#[test]
fn map_tracks_source() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let st = State::new((1, 'a'));
    let s = st.to_signal().map(|v| &v.0);
    let _e = s.subscribe(move |v| call!("{v}"), &mut rt.uc());
    cr.verify("1");

    st.set((2, 'b'), rt.ac());
    cr.verify("2");
}

#[test]
fn subscribe() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let st = State::new(10);
    let e = st.to_signal().subscribe(move |v| call!("{v}"), &mut rt.uc());
    cr.verify("10");

    st.set(20, rt.ac());
    cr.verify("20");

    drop(e);
    st.set(30, rt.ac());
    cr.verify(());
}

#[test]
fn to_signal_shares_computed_cache() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let st = State::new(1);
    let st_ = st.clone();
    let c = Computed::new(move |sc| {
        call!("compute");
        st_.get(sc) * 2
    });
    let s = c.to_signal();

    assert_eq!(c.get(&mut rt.sc()), 2);
    assert_eq!(s.get(&mut rt.sc()), 2);
    cr.verify("compute");
}

use assert_call::{call, CallRecorder};

use crate::Subscription;

#[test]
fn from_fn_called_on_drop() {
    let mut cr = CallRecorder::new();
    let s = Subscription::from_fn(|| call!("unsubscribe"));
    cr.verify(());

    drop(s);
    cr.verify("unsubscribe");
}

#[test]
fn empty_is_inert() {
    let s = Subscription::empty();
    drop(s);
}

use std::{any::Any, mem::take, rc::Rc};

#[cfg(test)]
mod tests;

/// Handle owning a subscription such as an [`effect`](crate::effect).
///
/// Dropping the handle cancels the subscription: the node it keeps alive is
/// released, unsubscribed from all of its current dependencies, and never
/// runs again.
#[derive(Default)]
#[must_use]
pub struct Subscription(RawSubscription);

impl Subscription {
    /// A subscription that owns nothing and cancels nothing.
    pub fn empty() -> Self {
        Subscription(RawSubscription::Empty)
    }

    /// Calls `f` when dropped.
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Subscription(RawSubscription::Fn(Box::new(f)))
    }

    /// Keeps `rc` alive until dropped.
    pub fn from_rc(rc: Rc<dyn Any>) -> Self {
        Subscription(RawSubscription::Rc(rc))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        match take(&mut self.0) {
            RawSubscription::Empty => {}
            RawSubscription::Fn(f) => f(),
            RawSubscription::Rc(_) => {}
        }
    }
}

#[derive(Default)]
enum RawSubscription {
    #[default]
    Empty,
    Fn(Box<dyn FnOnce() + 'static>),
    Rc(#[allow(unused)] Rc<dyn Any>),
}

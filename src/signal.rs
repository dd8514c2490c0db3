use std::{any::Any, rc::Rc};

use derive_ex::derive_ex;

use crate::{
    core::UpdateContext, effect, Computed, SignalContext, StateRef, Subscription,
};

#[cfg(test)]
mod tests;

/// Reactive node that can back a [`Signal`].
///
/// Implemented by the nodes behind [`State`](crate::State) and
/// [`Computed`](crate::Computed); implement it to plug a custom source into
/// the graph.
pub trait SignalNode: 'static {
    type Value: 'static;

    /// Obtains a reference to the current value and registers the node with
    /// the computation tracking in `sc`, if any.
    ///
    /// `inner` is the same node as `self`; the returned reference borrows
    /// from it, while `self` is available to register the subscription.
    fn borrow<'a>(
        self: Rc<Self>,
        inner: &'a Self,
        sc: &mut SignalContext,
    ) -> StateRef<'a, Self::Value>;
}

trait DynSignalNode {
    type Value: 'static;

    fn dyn_borrow<'a>(
        self: Rc<Self>,
        inner: &'a dyn Any,
        sc: &mut SignalContext,
    ) -> StateRef<'a, Self::Value>;

    fn as_any(&self) -> &dyn Any;
}

impl<S: SignalNode> DynSignalNode for S {
    type Value = S::Value;

    fn dyn_borrow<'a>(
        self: Rc<Self>,
        inner: &'a dyn Any,
        sc: &mut SignalContext,
    ) -> StateRef<'a, Self::Value> {
        self.borrow(inner.downcast_ref().unwrap(), sc)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Read-only view of a reactive value.
///
/// A `Signal` can be backed by a [`State`](crate::State), a
/// [`Computed`](crate::Computed), a constant, or a projection of another
/// signal; consumers read it uniformly without knowing which.
#[derive_ex(Clone, bound())]
pub struct Signal<T: 'static>(Rc<dyn DynSignalNode<Value = T>>);

impl<T: 'static> Signal<T> {
    /// Creates a computation-backed signal.
    ///
    /// Equivalent to [`Computed::new`] followed by
    /// [`Computed::to_signal`].
    pub fn new(f: impl Fn(&mut SignalContext) -> T + 'static) -> Self {
        Computed::new(f).to_signal()
    }

    /// Creates a signal that always yields the same value.
    pub fn from_value(value: T) -> Self {
        Self::from_node(Rc::new(ConstantNode { value }))
    }

    pub fn from_node(node: Rc<impl SignalNode<Value = T>>) -> Self {
        Signal(node)
    }

    /// Obtains a reference to the current value and adds a dependency on the
    /// backing node to the specified `SignalContext`.
    pub fn borrow<'a>(&'a self, sc: &mut SignalContext) -> StateRef<'a, T> {
        self.0.clone().dyn_borrow(self.0.as_any(), sc)
    }

    /// Gets the current value and adds a dependency on the backing node to
    /// the specified `SignalContext`.
    pub fn get(&self, sc: &mut SignalContext) -> T
    where
        T: Clone,
    {
        self.borrow(sc).clone()
    }

    /// Creates a signal projecting a part of this signal's value.
    ///
    /// The projection borrows through to the backing node; no value is cached.
    pub fn map<U: 'static>(&self, f: impl Fn(&T) -> &U + 'static) -> Signal<U> {
        Signal::from_node(Rc::new(MapNode {
            signal: self.clone(),
            f,
        }))
    }

    /// Calls `f` with the current value now and after every change.
    pub fn subscribe(
        &self,
        mut f: impl FnMut(&T) + 'static,
        uc: &mut UpdateContext,
    ) -> Subscription {
        let this = self.clone();
        effect(move |sc| f(&this.borrow(sc)), uc)
    }
}

/// Types convertible to a [`Signal`] view of themselves.
pub trait ToSignal {
    type Value: 'static;
    fn to_signal(&self) -> Signal<Self::Value>;
}

impl<T: ToSignal> ToSignal for &T {
    type Value = T::Value;
    fn to_signal(&self) -> Signal<Self::Value> {
        (*self).to_signal()
    }
}

impl<T: 'static> ToSignal for Signal<T> {
    type Value = T;
    fn to_signal(&self) -> Signal<Self::Value> {
        self.clone()
    }
}

struct ConstantNode<T> {
    value: T,
}

impl<T: 'static> SignalNode for ConstantNode<T> {
    type Value = T;

    fn borrow<'a>(
        self: Rc<Self>,
        inner: &'a Self,
        _sc: &mut SignalContext,
    ) -> StateRef<'a, Self::Value> {
        (&inner.value).into()
    }
}

struct MapNode<T: 'static, F> {
    signal: Signal<T>,
    f: F,
}

impl<T, U, F> SignalNode for MapNode<T, F>
where
    T: 'static,
    U: 'static,
    F: Fn(&T) -> &U + 'static,
{
    type Value = U;

    fn borrow<'a>(
        self: Rc<Self>,
        inner: &'a Self,
        sc: &mut SignalContext,
    ) -> StateRef<'a, Self::Value> {
        StateRef::map(inner.signal.borrow(sc), &inner.f)
    }
}

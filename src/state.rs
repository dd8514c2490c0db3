use std::{
    cell::{RefCell, RefMut},
    rc::Rc,
};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use crate::{
    core::{BindKey, BindSource, NotifyContext, SinkBindings, Slot},
    signal::SignalNode,
    ActionContext, Signal, SignalContext, StateRef, ToSignal,
};


/// Mutable reactive cell.
///
/// Similar to `Rc<RefCell<T>>`, but with added functionality to observe
/// changes: computations that read the cell through a tracking
/// [`SignalContext`] are re-run or invalidated when the value changes, and a
/// write returns only after the whole cascade has completed.
#[derive(Default)]
#[derive_ex(Clone, bound())]
pub struct State<T: 'static>(Rc<StateNode<T>>);

impl<T: 'static> State<T> {
    /// Create a new `State` with the given initial value.
    pub fn new(value: T) -> Self {
        Self(Rc::new(StateNode {
            sinks: RefCell::new(SinkBindings::new()),
            value: RefCell::new(value),
        }))
    }

    /// Obtains a reference to the current value and adds a dependency on this
    /// `State` to the specified `SignalContext`.
    pub fn borrow<'a>(&'a self, sc: &mut SignalContext) -> StateRef<'a, T> {
        self.0.bind(sc);
        self.0.value.borrow().into()
    }

    /// Gets the current value and adds a dependency on this `State` to the
    /// specified `SignalContext`.
    pub fn get(&self, sc: &mut SignalContext) -> T
    where
        T: Clone,
    {
        self.borrow(sc).clone()
    }

    /// Sets the value and synchronously notifies the dependencies, unless the
    /// new value compares equal to the current one.
    ///
    /// An equal value is not stored and nothing is notified, so reassigning a
    /// cell its own value never re-runs its dependents.
    pub fn set(&self, value: T, ac: &mut ActionContext)
    where
        T: PartialEq,
    {
        {
            let mut this_value = self.0.value.borrow_mut();
            if *this_value == value {
                return;
            }
            *this_value = value;
        }
        self.0.notify(ac.nc());
    }

    /// Sets the value and synchronously notifies the dependencies without
    /// comparing against the current value.
    ///
    /// Use for value types that do not implement `PartialEq`, or when
    /// replacing a structural value must count as a change even if the new
    /// contents happen to be equal.
    pub fn set_always(&self, value: T, ac: &mut ActionContext) {
        *self.0.value.borrow_mut() = value;
        self.0.notify(ac.nc());
    }

    /// Mutably borrows the value.
    ///
    /// When the returned guard is dropped, the dependencies are notified if
    /// the value was mutably dereferenced while the guard was alive.
    pub fn borrow_mut<'a>(&'a self, ac: &'a mut ActionContext) -> StateRefMut<'a, T> {
        StateRefMut {
            value: Some(self.0.value.borrow_mut()),
            is_dirty: false,
            node: &self.0,
            nc: ac.nc(),
        }
    }

    /// Returns a read-only [`Signal`] representing this state.
    pub fn to_signal(&self) -> Signal<T> {
        Signal::from_node(self.0.clone())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for State<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => std::fmt::Debug::fmt(&*value, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}

impl<T> Serialize for State<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        match self.0.value.try_borrow() {
            Ok(value) => T::serialize(&*value, serializer),
            Err(_) => Err(serde::ser::Error::custom("borrowed")),
        }
    }
}

impl<'de, T> Deserialize<'de> for State<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<State<T>, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        T::deserialize(deserializer).map(State::new)
    }
}

impl<T> ToSignal for State<T> {
    type Value = T;
    fn to_signal(&self) -> Signal<Self::Value> {
        self.to_signal()
    }
}

#[derive(Default)]
struct StateNode<T: 'static> {
    sinks: RefCell<SinkBindings>,
    value: RefCell<T>,
}

impl<T: 'static> StateNode<T> {
    fn bind(self: &Rc<Self>, sc: &mut SignalContext) {
        let displaced = self.sinks.borrow_mut().bind(self.clone(), Slot(0), sc);
        if let Some(b) = displaced {
            b.unbind();
        }
    }
    fn notify(&self, nc: &mut NotifyContext) {
        SinkBindings::notify(&self.sinks, nc);
    }
}

impl<T: 'static> BindSource for StateNode<T> {
    fn unbind(self: Rc<Self>, _slot: Slot, key: BindKey) {
        self.sinks.borrow_mut().unbind(key);
    }
}

impl<T: 'static> SignalNode for StateNode<T> {
    type Value = T;

    fn borrow<'a>(
        self: Rc<Self>,
        inner: &'a Self,
        sc: &mut SignalContext,
    ) -> StateRef<'a, Self::Value> {
        self.bind(sc);
        inner.value.borrow().into()
    }
}

/// Mutable borrow of a [`State`]'s value.
///
/// Dependencies are notified when the guard is dropped, after the borrow has
/// been released, and only if [`DerefMut`](std::ops::DerefMut) was used.
pub struct StateRefMut<'a, T: 'static> {
    value: Option<RefMut<'a, T>>,
    is_dirty: bool,
    node: &'a Rc<StateNode<T>>,
    nc: &'a mut NotifyContext,
}

impl<T> std::ops::Deref for StateRefMut<'_, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        self.value.as_ref().unwrap()
    }
}

impl<T> std::ops::DerefMut for StateRefMut<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.is_dirty = true;
        self.value.as_mut().unwrap()
    }
}

impl<T> Drop for StateRefMut<'_, T> {
    fn drop(&mut self) {
        self.value = None;
        if self.is_dirty {
            self.node.notify(self.nc);
        }
    }
}

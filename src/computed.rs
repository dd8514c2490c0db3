use std::{cell::RefCell, rc::Rc};

use derive_ex::derive_ex;

use crate::{
    core::{BindKey, BindSink, BindSource, NotifyContext, SinkBindings, Slot, SourceBinder},
    signal::SignalNode,
    Signal, SignalContext, StateRef, ToSignal,
};

#[cfg(test)]
mod tests;

/// Read-only reactive cell computed from other cells.
///
/// The computation runs lazily: when a dependency changes, the cell is only
/// marked stale and its own dependents are notified. The value is recomputed
/// on the next read, cached, and reused until a dependency changes again.
///
/// The dependency set is rebuilt on every recomputation, so a computation
/// with conditional reads subscribes only to the cells its latest run
/// actually read.
#[derive_ex(Clone, bound())]
pub struct Computed<T: 'static>(Rc<ComputedNode<T>>);

impl<T: 'static> Computed<T> {
    pub fn new(f: impl Fn(&mut SignalContext) -> T + 'static) -> Self {
        Self(ComputedNode::new(Box::new(f)))
    }

    /// Obtains a reference to the current value, recomputing it if stale, and
    /// adds a dependency on this `Computed` to the specified `SignalContext`.
    ///
    /// The dependency added to an outer computation is this cell itself, not
    /// the cells its own computation reads.
    ///
    /// # Panics
    ///
    /// Panics if the computation reads this cell, directly or transitively.
    pub fn borrow<'a>(&'a self, sc: &mut SignalContext) -> StateRef<'a, T> {
        self.0.clone().read(&self.0, sc)
    }

    /// Gets the current value, recomputing it if stale, and adds a dependency
    /// on this `Computed` to the specified `SignalContext`.
    pub fn get(&self, sc: &mut SignalContext) -> T
    where
        T: Clone,
    {
        self.borrow(sc).clone()
    }

    /// Returns a read-only [`Signal`] representing this cell.
    pub fn to_signal(&self) -> Signal<T> {
        Signal::from_node(self.0.clone())
    }
}

impl<T> ToSignal for Computed<T> {
    type Value = T;
    fn to_signal(&self) -> Signal<Self::Value> {
        self.to_signal()
    }
}

struct ComputedNode<T: 'static> {
    f: Box<dyn Fn(&mut SignalContext) -> T>,
    sinks: RefCell<SinkBindings>,
    data: RefCell<ComputedData<T>>,
}

struct ComputedData<T> {
    value: Option<T>,
    sb: SourceBinder,
}

impl<T: 'static> ComputedNode<T> {
    fn new(f: Box<dyn Fn(&mut SignalContext) -> T>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            f,
            sinks: RefCell::new(SinkBindings::new()),
            data: RefCell::new(ComputedData {
                value: None,
                sb: SourceBinder::new(this, Slot(0)),
            }),
        })
    }

    fn bind(self: &Rc<Self>, sc: &mut SignalContext) {
        let displaced = self.sinks.borrow_mut().bind(self.clone(), Slot(0), sc);
        if let Some(b) = displaced {
            b.unbind();
        }
    }

    fn read<'a>(self: Rc<Self>, inner: &'a Self, sc: &mut SignalContext) -> StateRef<'a, T> {
        self.bind(sc);
        {
            let mut d = match inner.data.try_borrow_mut() {
                Ok(d) => d,
                Err(_) => panic!("cyclic dependency detected"),
            };
            if !d.sb.is_clean() {
                let f = &inner.f;
                let value = d.sb.update(|sc| f(sc), sc.uc());
                d.value = Some(value);
            }
        }
        StateRef::map(StateRef::from(inner.data.borrow()), |d| {
            d.value.as_ref().unwrap()
        })
    }
}

impl<T: 'static> BindSource for ComputedNode<T> {
    fn unbind(self: Rc<Self>, _slot: Slot, key: BindKey) {
        self.sinks.borrow_mut().unbind(key);
    }
}

impl<T: 'static> BindSink for ComputedNode<T> {
    fn notify(self: Rc<Self>, slot: Slot, nc: &mut NotifyContext) {
        // Propagate only on the clean-to-stale transition; dependents of an
        // already stale cell have been notified before.
        let need_propagate = self.data.borrow_mut().sb.on_notify(slot);
        if need_propagate {
            SinkBindings::notify(&self.sinks, nc);
        }
    }
}

impl<T: 'static> SignalNode for ComputedNode<T> {
    type Value = T;

    fn borrow<'a>(
        self: Rc<Self>,
        inner: &'a Self,
        sc: &mut SignalContext,
    ) -> StateRef<'a, Self::Value> {
        self.read(inner, sc)
    }
}

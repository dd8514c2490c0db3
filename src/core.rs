//! Dependency-tracking core of the reactive graph.
//!
//! Reads and writes go through context values rooted in a [`Runtime`]:
//! [`SignalContext`] for tracked reads, [`ActionContext`] for writes,
//! [`NotifyContext`] while a change is being propagated and [`UpdateContext`]
//! for re-running invalidated computations. Propagation is synchronous: a
//! write runs the whole notify/re-run cascade on the calling stack before it
//! returns.

use std::{
    cell::{Cell, RefCell},
    marker::PhantomData,
    mem::{replace, take, transmute},
    rc::{Rc, Weak},
};

use derive_ex::derive_ex;
use slabmap::SlabMap;

mod source_binder;
mod state_ref;

#[cfg(test)]
mod tests;

pub use source_binder::SourceBinder;
pub use state_ref::StateRef;

thread_local! {
    static RUNTIME_EXISTS: Cell<bool> = Cell::new(false);
}

/// Reactive runtime.
///
/// Root of a reactive graph and the only source of the context values used to
/// read and write it. At most one `Runtime` may exist per thread at a time, so
/// independent graphs (such as those of concurrently running tests) cannot
/// interfere with each other.
#[derive_ex(Default)]
#[default(Self::new())]
pub struct Runtime {
    _not_send: PhantomData<Rc<()>>,
}

impl Runtime {
    /// Creates the runtime for the current thread.
    ///
    /// # Panics
    ///
    /// Panics if another `Runtime` already exists on this thread.
    pub fn new() -> Self {
        if RUNTIME_EXISTS.with(|e| e.replace(true)) {
            panic!("Only one `Runtime` can exist in the same thread at the same time.");
        }
        Self {
            _not_send: PhantomData,
        }
    }

    /// Context for changing state.
    pub fn ac(&mut self) -> &mut ActionContext {
        ActionContext::new(self)
    }

    /// Context for reading state without tracking dependencies.
    pub fn sc(&mut self) -> SignalContext {
        SignalContext { sink: None }
    }

    /// Context for creating tracked computations such as
    /// [`effect`](crate::effect).
    pub fn uc(&mut self) -> UpdateContext {
        UpdateContext(SignalContext { sink: None })
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        RUNTIME_EXISTS.with(|e| e.set(false));
    }
}

/// Context for changing state.
#[repr(transparent)]
pub struct ActionContext(Runtime);

impl ActionContext {
    fn new(rt: &mut Runtime) -> &mut Self {
        unsafe { transmute(rt) }
    }

    pub fn nc(&mut self) -> &mut NotifyContext {
        NotifyContext::new(self)
    }

    /// Context for reading state without tracking dependencies.
    pub fn sc(&mut self) -> SignalContext {
        SignalContext { sink: None }
    }
}

/// Context for state invalidation notification.
///
/// Exists while a change cascade is running. Effects re-run from inside the
/// cascade through [`NotifyContext::uc`].
#[repr(transparent)]
pub struct NotifyContext(ActionContext);

impl NotifyContext {
    fn new(ac: &mut ActionContext) -> &mut Self {
        unsafe { transmute(ac) }
    }

    /// Context for re-running the computations invalidated by this
    /// notification.
    pub fn uc(&mut self) -> UpdateContext {
        UpdateContext(SignalContext { sink: None })
    }
}

/// Context for retrieving state and tracking dependencies.
///
/// While a computation runs, its `SignalContext` holds the sink collecting the
/// sources read so far. Nested computations get a fresh context; the outer one
/// is unreachable until the inner run finishes, so a read always registers
/// with the innermost active computation only.
pub struct SignalContext<'s> {
    sink: Option<&'s mut Sink>,
}

impl<'s> SignalContext<'s> {
    pub fn uc(&mut self) -> &mut UpdateContext<'s> {
        UpdateContext::new(self)
    }

    /// Call a function with a `SignalContext` that does not track dependencies.
    ///
    /// Tracking is restored on all exit paths, including unwinding.
    pub fn untrack<T>(&mut self, f: impl FnOnce(&mut SignalContext<'s>) -> T) -> T {
        struct UntrackGuard<'s, 'a> {
            sc: &'a mut SignalContext<'s>,
            sink: Option<&'s mut Sink>,
        }
        impl Drop for UntrackGuard<'_, '_> {
            fn drop(&mut self) {
                self.sc.sink = self.sink.take();
            }
        }
        f(UntrackGuard {
            sink: self.sink.take(),
            sc: self,
        }
        .sc)
    }
}

/// Context for updating tracked computations.
///
/// Obtained from [`Runtime::uc`], [`NotifyContext::uc`] or
/// [`SignalContext::uc`].
#[repr(transparent)]
pub struct UpdateContext<'s>(SignalContext<'s>);

impl<'s> UpdateContext<'s> {
    fn new<'a>(sc: &'a mut SignalContext<'s>) -> &'a mut Self {
        unsafe { transmute(sc) }
    }
}

/// Identifies one of a node's dependency positions.
///
/// Nodes with a single upstream role use `Slot(0)`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Slot(pub usize);

/// Key of a subscriber entry in a source's [`SinkBindings`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BindKey(usize);

/// Reactive node that can be depended on.
pub trait BindSource: 'static {
    /// Removes the subscriber entry identified by `key`.
    fn unbind(self: Rc<Self>, slot: Slot, key: BindKey);
}

/// Reactive node that depends on [`BindSource`]s.
pub trait BindSink: 'static {
    /// Called when the source bound at `slot` has changed.
    fn notify(self: Rc<Self>, slot: Slot, nc: &mut NotifyContext);
}

/// One edge from a sink to a source it reads.
///
/// Holds the source strongly: a live computation keeps everything it reads
/// alive. The reverse edge (source to sink) is weak.
pub struct SourceBinding {
    source: Rc<dyn BindSource>,
    slot: Slot,
    key: BindKey,
}

impl SourceBinding {
    fn is_same(&self, source: &Rc<dyn BindSource>, slot: Slot) -> bool {
        Rc::ptr_eq(&self.source, source) && self.slot == slot
    }
    pub fn unbind(self) {
        let Self { source, slot, key } = self;
        source.unbind(slot, key);
    }
}

/// Dependencies of a single reactive computation.
#[derive(Default)]
pub struct SourceBindings(Vec<SourceBinding>);

impl SourceBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with dependency tracking, rebuilding this list to exactly the
    /// sources read during the run.
    ///
    /// Sources also read by the previous run keep their subscriber entries
    /// (positionally when the read order is stable, otherwise re-registered);
    /// entries for sources no longer read are removed. If `f` unwinds, the
    /// list is left empty with every entry removed, so the next run starts
    /// from scratch.
    pub fn update<T>(
        &mut self,
        sink: Weak<dyn BindSink>,
        slot: Slot,
        f: impl FnOnce(&mut SignalContext) -> T,
        _uc: &mut UpdateContext,
    ) -> T {
        let mut sink = Sink {
            sink,
            slot,
            sources: take(self),
            sources_len: 0,
        };
        let mut sc = SignalContext {
            sink: Some(&mut sink),
        };
        let ret = f(&mut sc);
        *self = sink.sources;
        for b in self.0.drain(sink.sources_len..) {
            b.unbind();
        }
        ret
    }

    pub fn clear(&mut self) {
        for b in self.0.drain(..) {
            b.unbind();
        }
    }
}

impl Drop for SourceBindings {
    fn drop(&mut self) {
        self.clear();
    }
}

#[derive(Clone)]
struct SinkBinding {
    sink: Weak<dyn BindSink>,
    slot: Slot,
}

impl SinkBinding {
    fn notify(&self, nc: &mut NotifyContext) {
        if let Some(sink) = self.sink.upgrade() {
            sink.notify(self.slot, nc);
        }
    }
}

/// Subscribers of a single reactive source, keyed for O(1) removal.
#[derive(Default)]
pub struct SinkBindings(SlabMap<SinkBinding>);

impl SinkBindings {
    pub fn new() -> Self {
        Self(SlabMap::new())
    }

    /// Registers the sink currently collecting dependencies in `sc`, if any.
    ///
    /// Registration is idempotent within one tracked run: a source read twice
    /// by the same computation gets a single entry. Returns a binding
    /// displaced from the sink's source list; the caller must release its
    /// borrow of this table before unbinding it.
    #[must_use]
    pub fn bind(
        &mut self,
        this: Rc<dyn BindSource>,
        this_slot: Slot,
        sc: &mut SignalContext,
    ) -> Option<SourceBinding> {
        let Some(sink) = &mut sc.sink else {
            return None;
        };
        let index = sink.sources_len;
        if let Some(old) = sink.sources.0.get(index) {
            if old.is_same(&this, this_slot) {
                sink.sources_len += 1;
                return None;
            }
        }
        if sink.sources.0[..index]
            .iter()
            .any(|b| b.is_same(&this, this_slot))
        {
            return None;
        }
        let key = BindKey(self.0.insert(SinkBinding {
            sink: sink.sink.clone(),
            slot: sink.slot,
        }));
        sink.push(SourceBinding {
            source: this,
            slot: this_slot,
            key,
        })
    }

    /// Removes the subscriber entry identified by `key`.
    pub fn unbind(&mut self, key: BindKey) {
        self.0.remove(key.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Notifies every subscriber, iterating over a snapshot taken at call
    /// time so subscriber-set changes during the cascade (sinks re-binding or
    /// being dropped) cannot affect the iteration.
    pub fn notify(this: &RefCell<Self>, nc: &mut NotifyContext) {
        let snapshot: Vec<SinkBinding> = {
            let mut b = this.borrow_mut();
            b.0.optimize();
            b.0.values().cloned().collect()
        };
        for binding in snapshot {
            binding.notify(nc);
        }
    }
}

struct Sink {
    sink: Weak<dyn BindSink>,
    slot: Slot,
    sources: SourceBindings,
    sources_len: usize,
}

impl Sink {
    #[must_use]
    fn push(&mut self, binding: SourceBinding) -> Option<SourceBinding> {
        let index = self.sources_len;
        self.sources_len += 1;
        if index < self.sources.0.len() {
            Some(replace(&mut self.sources.0[index], binding))
        } else {
            self.sources.0.push(binding);
            None
        }
    }
}

use std::rc::Weak;

use crate::SignalContext;

use super::{BindSink, Slot, SourceBindings, UpdateContext};

/// Tracks the sources and dirty state of a single reactive computation.
pub struct SourceBinder {
    sources: SourceBindings,
    is_dirty: bool,
    sink: Weak<dyn BindSink>,
    slot: Slot,
}

impl SourceBinder {
    /// Creates a binder for `sink`, initially dirty so the first
    /// [`update`](Self::update) always runs.
    pub fn new(sink: &Weak<impl BindSink>, slot: Slot) -> Self {
        Self {
            sources: SourceBindings::new(),
            is_dirty: true,
            sink: sink.clone(),
            slot,
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.is_dirty
    }

    /// Re-runs the computation, rebuilding its dependency set.
    ///
    /// The node is marked clean only when `f` returns; if `f` unwinds the
    /// node stays dirty and its dependency set is left empty, so the next run
    /// starts from scratch.
    pub fn update<T>(
        &mut self,
        f: impl FnOnce(&mut SignalContext) -> T,
        uc: &mut UpdateContext,
    ) -> T {
        let ret = self.sources.update(self.sink.clone(), self.slot, f, uc);
        self.is_dirty = false;
        ret
    }

    /// Records an invalidation coming from one of the sources.
    ///
    /// Returns `true` if the node was clean, i.e. this is the first
    /// invalidation since the last run and needs to be acted on.
    pub fn on_notify(&mut self, slot: Slot) -> bool {
        if slot != self.slot {
            return false;
        }
        let was_clean = !self.is_dirty;
        self.is_dirty = true;
        was_clean
    }

    pub fn clear(&mut self) {
        self.sources.clear();
        self.is_dirty = true;
    }
}

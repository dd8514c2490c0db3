use std::{cell::RefCell, rc::Rc};

use crate::{
    core::{BindSink, NotifyContext, Slot, SourceBinder, UpdateContext},
    SignalContext, Subscription,
};


/// Calls a function now and each time a dependency changes.
///
/// The first run happens before `effect` returns. Every later run happens
/// synchronously inside the write that changed a dependency, before that
/// write returns to its caller. The dependency set is rebuilt from scratch on
/// every run, so conditional reads re-wire the subscriptions they take.
///
/// If the [`Subscription`] returned from this function is dropped, the
/// function will not be called again.
pub fn effect(
    f: impl FnMut(&mut SignalContext) + 'static,
    uc: &mut UpdateContext,
) -> Subscription {
    let node = EffectNode::new(f);
    node.run(uc);
    Subscription::from_rc(node)
}

struct EffectData<F> {
    f: F,
    sb: SourceBinder,
}

struct EffectNode<F> {
    data: RefCell<EffectData<F>>,
}

impl<F> EffectNode<F>
where
    F: FnMut(&mut SignalContext) + 'static,
{
    fn new(f: F) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            data: RefCell::new(EffectData {
                f,
                sb: SourceBinder::new(this, Slot(0)),
            }),
        })
    }

    fn run(self: &Rc<Self>, uc: &mut UpdateContext) {
        let d = &mut *self.data.borrow_mut();
        d.sb.update(&mut d.f, uc);
    }
}

impl<F> BindSink for EffectNode<F>
where
    F: FnMut(&mut SignalContext) + 'static,
{
    fn notify(self: Rc<Self>, slot: Slot, nc: &mut NotifyContext) {
        // The borrow must end before `run` borrows the data again.
        let need_run = self.data.borrow_mut().sb.on_notify(slot);
        if need_run {
            self.run(&mut nc.uc());
        }
    }
}

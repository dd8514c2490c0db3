//! Synchronous fine-grained reactivity: mutable state cells, cached computed
//! values and effects with automatic dependency tracking.
//!
//! Reading a cell from within a computation subscribes the computation to the
//! cell; writing a changed value synchronously re-runs everything that
//! depends on it, before the write returns. Computed values are lazy: a
//! change only marks them stale, and they recompute on the next read.
//!
//! ```
//! use ripple::{core::Runtime, effect, Computed, State};
//!
//! let mut rt = Runtime::new();
//! let count = State::new(0);
//!
//! let count_ = count.clone();
//! let doubled = Computed::new(move |sc| count_.get(sc) * 2);
//!
//! let doubled_ = doubled.clone();
//! let _s = effect(move |sc| println!("doubled = {}", doubled_.get(sc)), &mut rt.uc());
//! // prints "doubled = 0"
//!
//! count.set(1, rt.ac()); // prints "doubled = 2" before `set` returns
//! count.set(1, rt.ac()); // unchanged value, prints nothing
//! assert_eq!(doubled.get(&mut rt.sc()), 2);
//! ```

mod computed;
pub mod core;
mod effect_fn;
mod signal;
mod state;
mod subscription;

pub use self::core::{ActionContext, NotifyContext, SignalContext, StateRef, UpdateContext};
pub use computed::Computed;
pub use effect_fn::effect;
pub use signal::{Signal, SignalNode, ToSignal};
pub use state::{State, StateRefMut};
pub use subscription::Subscription;

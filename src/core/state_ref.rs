use std::{cell::Ref, fmt, ops::Deref};

/// Reference to a value owned by a reactive node.
///
/// Abstracts over a borrow of a `RefCell`-backed cell and a plain reference
/// to a constant value.
pub struct StateRef<'a, T: ?Sized>(RawStateRef<'a, T>);

enum RawStateRef<'a, T: ?Sized> {
    Cell(Ref<'a, T>),
    Direct(&'a T),
}

impl<'a, T: ?Sized> StateRef<'a, T> {
    /// Projects the reference to a part of the referenced value.
    ///
    /// Associated function, so it does not collide with a method of the
    /// referenced value.
    pub fn map<U: ?Sized>(this: Self, f: impl FnOnce(&T) -> &U) -> StateRef<'a, U> {
        match this.0 {
            RawStateRef::Cell(r) => StateRef(RawStateRef::Cell(Ref::map(r, f))),
            RawStateRef::Direct(r) => StateRef(RawStateRef::Direct(f(r))),
        }
    }
}

impl<T: ?Sized> Deref for StateRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.0 {
            RawStateRef::Cell(r) => r,
            RawStateRef::Direct(r) => r,
        }
    }
}

impl<'a, T: ?Sized> From<Ref<'a, T>> for StateRef<'a, T> {
    fn from(r: Ref<'a, T>) -> Self {
        StateRef(RawStateRef::Cell(r))
    }
}

impl<'a, T: ?Sized> From<&'a T> for StateRef<'a, T> {
    fn from(r: &'a T) -> Self {
        StateRef(RawStateRef::Direct(r))
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for StateRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        T::fmt(self, f)
    }
}

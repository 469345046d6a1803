//! Typed handles into a storage session.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A handle to an entity of kind `T` tracked by a storage session.
///
/// Keys are stable for the lifetime of the session that issued them and stay
/// valid across flushes, so a freshly created entity can be referenced as a
/// parent before it has a database id.
pub struct Key<T> {
    index: usize,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    /// Creates a key for the given slot index. Only storage sessions should
    /// mint keys.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            _kind: PhantomData,
        }
    }

    /// Returns the slot index inside the session table.
    pub fn index(self) -> usize {
        self.index
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Key<T> {}

impl<T> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.index)
    }
}

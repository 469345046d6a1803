//! Replayable iteration over single-pass sources.

use std::vec;

/// Buffers the items of a one-shot iterator so they can be walked any number
/// of times.
///
/// Every pass first replays the items cached so far and then keeps pulling
/// from the source, caching each new item before handing it out. A pass may
/// stop early; the next pass picks up where the source left off after
/// replaying the cache.
///
/// Sources yielding `Result` items are walked with [`try_iter`]: `Ok` items
/// are cached, the first `Err` is handed out once and the source is dropped.
/// The prefix produced before the failure stays replayable while the tail is
/// lost for good.
///
/// [`try_iter`]: CachedIterable::try_iter
#[derive(Debug)]
pub struct CachedIterable<T, I> {
    cache: Vec<T>,
    source: Option<I>,
}

impl<T, I> CachedIterable<T, I> {
    /// Wraps a source without pulling from it.
    pub fn new<S>(source: S) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        Self {
            cache: Vec::new(),
            source: Some(source.into_iter()),
        }
    }

    /// Items produced by the source so far.
    pub fn cached(&self) -> &[T] {
        &self.cache
    }

    /// Returns `true` once the source has ended or failed.
    pub fn is_exhausted(&self) -> bool {
        self.source.is_none()
    }
}

impl<T: Clone, I: Iterator<Item = T>> CachedIterable<T, I> {
    /// Starts a new pass over the items.
    pub fn iter(&mut self) -> Iter<'_, T, I> {
        Iter {
            owner: self,
            position: 0,
        }
    }
}

impl<T: Clone, E, I: Iterator<Item = Result<T, E>>> CachedIterable<T, I> {
    /// Starts a new pass over a fallible source.
    pub fn try_iter(&mut self) -> TryIter<'_, T, I> {
        TryIter {
            owner: self,
            position: 0,
        }
    }
}

/// One pass over a [`CachedIterable`].
pub struct Iter<'a, T, I> {
    owner: &'a mut CachedIterable<T, I>,
    position: usize,
}

impl<T: Clone, I: Iterator<Item = T>> Iterator for Iter<'_, T, I> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if let Some(item) = self.owner.cache.get(self.position) {
            self.position += 1;
            return Some(item.clone());
        }
        match self.owner.source.as_mut()?.next() {
            Some(item) => {
                self.owner.cache.push(item.clone());
                self.position += 1;
                Some(item)
            }
            None => {
                self.owner.source = None;
                None
            }
        }
    }
}

/// One pass over a [`CachedIterable`] wrapping a fallible source.
pub struct TryIter<'a, T, I> {
    owner: &'a mut CachedIterable<T, I>,
    position: usize,
}

impl<T: Clone, E, I: Iterator<Item = Result<T, E>>> Iterator for TryIter<'_, T, I> {
    type Item = Result<T, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.owner.cache.get(self.position) {
            self.position += 1;
            return Some(Ok(item.clone()));
        }
        match self.owner.source.as_mut()?.next() {
            Some(Ok(item)) => {
                self.owner.cache.push(item.clone());
                self.position += 1;
                Some(Ok(item))
            }
            Some(Err(err)) => {
                self.owner.source = None;
                Some(Err(err))
            }
            None => {
                self.owner.source = None;
                None
            }
        }
    }
}

impl<T, I: Iterator<Item = T>> IntoIterator for CachedIterable<T, I> {
    type Item = T;
    type IntoIter = IntoIter<T, I>;

    /// Consumes the wrapper: yields the cache, then the rest of the source.
    fn into_iter(self) -> IntoIter<T, I> {
        IntoIter {
            cached: self.cache.into_iter(),
            source: self.source,
        }
    }
}

/// Owning pass over a [`CachedIterable`].
pub struct IntoIter<T, I> {
    cached: vec::IntoIter<T>,
    source: Option<I>,
}

impl<T, I: Iterator<Item = T>> Iterator for IntoIter<T, I> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if let Some(item) = self.cached.next() {
            return Some(item);
        }
        let item = self.source.as_mut()?.next();
        if item.is_none() {
            self.source = None;
        }
        item
    }
}

//! Insertion-ordered maps keyed by content etag.

use std::collections::HashMap;

use mvtool_core::Etag;
use mvtool_core::imports::ImportRecord;

/// Map from etag to value that remembers the order in which etags were
/// first inserted.
///
/// Inserting an etag that is already present replaces the value but keeps
/// its original position.
#[derive(Debug, Clone)]
pub struct EtagMap<V> {
    entries: Vec<(Etag, V)>,
    index: HashMap<Etag, usize>,
}

impl<V> Default for EtagMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> EtagMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, etag: Etag, value: V) {
        match self.index.get(&etag) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(etag.clone(), self.entries.len());
                self.entries.push((etag, value));
            }
        }
    }

    pub fn get(&self, etag: &Etag) -> Option<&V> {
        self.index.get(etag).map(|&position| &self.entries[position].1)
    }

    /// Looks up the value stored for a record structurally equal to
    /// `import`.
    pub fn get_for<I: ImportRecord>(&self, import: &I) -> Option<&V> {
        self.get(&import.etag())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Pairs the keys, in insertion order, with `values`. Keys beyond the
    /// end of `values` are dropped.
    pub fn replace_values<W, I>(self, values: I) -> EtagMap<W>
    where
        I: IntoIterator<Item = W>,
    {
        let mut out = EtagMap::new();
        for ((etag, _), value) in self.entries.into_iter().zip(values) {
            out.insert(etag, value);
        }
        out
    }
}

impl<I: ImportRecord> FromIterator<I> for EtagMap<I> {
    /// Keys every record by its own etag.
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        let mut map = Self::new();
        for import in iter {
            map.insert(import.etag(), import);
        }
        map
    }
}

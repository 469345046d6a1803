//! Per-request cache of external entities.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use mvtool_core::ExternalEntity;

use crate::error::Result;

/// Remembers external entities, and their absence, by external id.
///
/// A cache lives for one request. Entries are never invalidated, so an
/// entity that changes remotely during the request keeps its first value.
#[derive(Debug)]
pub struct ExternalRefCache<T> {
    entries: HashMap<String, Option<T>>,
}

impl<T> Default for ExternalRefCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T: ExternalEntity> ExternalRefCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached ids, absent ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached entry for `id`: `Some(None)` when the entity is
    /// known to be absent, `None` when nothing is cached.
    pub fn get(&self, id: &str) -> Option<Option<&T>> {
        self.entries.get(id).map(Option::as_ref)
    }

    pub fn insert(&mut self, entity: T) {
        self.entries
            .insert(entity.external_id().to_owned(), Some(entity));
    }

    /// Returns the entity with the given id.
    ///
    /// A cached entry is returned as is. On a miss nothing happens unless
    /// `try_fetch` is set, in which case `fetch` is called. A "not found" or
    /// "forbidden" answer is cached as absent; any other error is passed on
    /// and nothing is cached.
    pub fn lookup_or_fetch<F>(&mut self, id: &str, try_fetch: bool, fetch: F) -> Result<Option<T>>
    where
        F: FnOnce(&str) -> Result<T>,
    {
        if let Some(entry) = self.entries.get(id) {
            return Ok(entry.clone());
        }
        if !try_fetch {
            return Ok(None);
        }
        let entry = match fetch(id) {
            Ok(entity) => Some(entity),
            Err(err) if err.is_not_found() => {
                debug!(kind = T::KIND, id, "external entity not visible");
                None
            }
            Err(err) => return Err(err),
        };
        self.entries.insert(id.to_owned(), entry.clone());
        Ok(entry)
    }

    /// Fetches the entities for a set of keys or ids with a single call and
    /// caches them.
    ///
    /// Duplicate and empty keys are dropped; when none remain `fetch` is not
    /// called at all. The result maps each requested key to the entity whose
    /// key or id equals it. Requested keys without a match are left out.
    pub fn batch_fetch<'k, K, F>(&mut self, keys: K, fetch: F) -> Result<HashMap<String, T>>
    where
        K: IntoIterator<Item = &'k str>,
        F: FnOnce(&[String]) -> Result<Vec<T>>,
    {
        let wanted: BTreeSet<&str> = keys.into_iter().filter(|k| !k.is_empty()).collect();
        if wanted.is_empty() {
            return Ok(HashMap::new());
        }
        let wanted: Vec<String> = wanted.into_iter().map(str::to_owned).collect();
        let entities = fetch(&wanted)?;
        debug!(
            kind = T::KIND,
            requested = wanted.len(),
            found = entities.len(),
            "batch fetched external entities"
        );

        let mut found = HashMap::with_capacity(wanted.len());
        for entity in entities {
            for handle in [entity.external_key(), entity.external_id()] {
                if wanted.iter().any(|k| k == handle) {
                    found.insert(handle.to_owned(), entity.clone());
                }
            }
            self.insert(entity);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JiraError;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: String,
        key: String,
    }

    impl ExternalEntity for Item {
        const KIND: &'static str = "item";

        fn external_id(&self) -> &str {
            &self.id
        }

        fn external_key(&self) -> &str {
            &self.key
        }
    }

    fn item(id: &str, key: &str) -> Item {
        Item {
            id: id.into(),
            key: key.into(),
        }
    }

    #[test]
    fn miss_without_try_fetch_is_absent_and_uncached() {
        let mut cache = ExternalRefCache::<Item>::new();
        let found = cache
            .lookup_or_fetch("1", false, |_| panic!("must not fetch"))
            .unwrap();
        assert_eq!(found, None);
        assert!(cache.is_empty());
    }

    #[test]
    fn fetched_entity_is_served_from_cache() {
        let mut cache = ExternalRefCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let found = cache
                .lookup_or_fetch("1", true, |id| {
                    calls += 1;
                    Ok(item(id, "A-1"))
                })
                .unwrap();
            assert_eq!(found, Some(item("1", "A-1")));
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn not_found_is_cached_as_absent() {
        let mut cache = ExternalRefCache::<Item>::new();
        let found = cache
            .lookup_or_fetch("9", true, |_| Err(JiraError::status(404)))
            .unwrap();
        assert_eq!(found, None);
        assert_eq!(cache.get("9"), Some(None));

        let found = cache
            .lookup_or_fetch("8", true, |_| Err(JiraError::status(403)))
            .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn other_errors_propagate_uncached() {
        let mut cache = ExternalRefCache::<Item>::new();
        let err = cache
            .lookup_or_fetch("1", true, |_| Err(JiraError::status(500)))
            .unwrap_err();
        assert!(matches!(err, JiraError::Status { status: 500 }));
        assert_eq!(cache.get("1"), None);
    }

    #[test]
    fn batch_fetch_dedups_and_skips_empty_sets() {
        let mut cache = ExternalRefCache::new();
        let mut seen = Vec::new();
        let found = cache
            .batch_fetch(["A-1", "A-2", "A-1", ""], |keys| {
                seen.push(keys.to_vec());
                Ok(vec![item("1", "A-1")])
            })
            .unwrap();
        assert_eq!(seen, vec![vec!["A-1".to_owned(), "A-2".to_owned()]]);
        assert_eq!(found.len(), 1);
        assert_eq!(found["A-1"], item("1", "A-1"));
        assert_eq!(cache.get("1"), Some(Some(&item("1", "A-1"))));

        let found = cache
            .batch_fetch(Vec::<&str>::new(), |_| panic!("must not fetch"))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn batch_fetch_matches_by_id() {
        let mut cache = ExternalRefCache::new();
        let found = cache
            .batch_fetch(["7"], |_| Ok(vec![item("7", "B-3")]))
            .unwrap();
        assert_eq!(found["7"].key, "B-3");
    }
}

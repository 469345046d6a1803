//! Lazily resolved references to entities living in an external system.

use std::cell::{Cell, OnceCell};

/// Whether resolving a reference may call out to the external system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Fetch on a cache miss.
    #[default]
    TryFetch,
    /// Only consult what is already cached.
    CacheOnly,
}

impl FetchPolicy {
    /// Returns `true` for [`FetchPolicy::TryFetch`].
    pub fn try_fetch(self) -> bool {
        self == Self::TryFetch
    }
}

/// An entity owned by an external system, addressable by id and by key.
pub trait ExternalEntity: Clone {
    /// Human-readable kind used in error messages, e.g. "Jira issue".
    const KIND: &'static str;

    /// Stable id assigned by the external system.
    fn external_id(&self) -> &str;

    /// Human-facing key, e.g. `PROJ-12`.
    fn external_key(&self) -> &str;
}

/// Something that can look up external entities by id, usually a cache in
/// front of a remote client.
pub trait ExternalLookup<T> {
    type Error;

    /// Returns the entity with the given id, `None` if it is absent or not
    /// visible. A miss only calls out when `try_fetch` is set.
    fn lookup_or_fetch(&mut self, id: &str, try_fetch: bool) -> Result<Option<T>, Self::Error>;
}

/// A reference to an external entity stored by id.
///
/// Resolution happens on demand through [`resolve`](ExternalRef::resolve)
/// and is memoized: once resolved, later calls return the same value without
/// touching the lookup. The fetch policy is bound after loading, so a
/// listing that already warmed its cache can forbid further remote calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalRef<T> {
    id: Option<String>,
    policy: Cell<FetchPolicy>,
    resolved: OnceCell<Option<T>>,
}

impl<T> Default for ExternalRef<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<T> ExternalRef<T> {
    /// Creates an unresolved reference.
    pub fn new(id: Option<String>) -> Self {
        Self {
            id,
            policy: Cell::new(FetchPolicy::default()),
            resolved: OnceCell::new(),
        }
    }

    /// Returns the external id, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Replaces the id and forgets any earlier resolution.
    pub fn set_id(&mut self, id: Option<String>) {
        self.id = id;
        self.resolved = OnceCell::new();
    }

    /// Binds the policy used by the next resolution.
    pub fn bind(&self, policy: FetchPolicy) {
        self.policy.set(policy);
    }

    /// Returns the currently bound policy.
    pub fn policy(&self) -> FetchPolicy {
        self.policy.get()
    }

    /// Returns the memoized resolution without resolving.
    pub fn resolved(&self) -> Option<Option<&T>> {
        self.resolved.get().map(Option::as_ref)
    }
}

impl<T: ExternalEntity> ExternalRef<T> {
    /// Points the reference at an entity that is already known, or clears it.
    pub fn assign(&mut self, entity: Option<&T>) {
        self.id = entity.map(|e| e.external_id().to_owned());
        self.resolved = OnceCell::from(entity.cloned());
    }

    /// Resolves the reference through `lookup` according to the bound policy.
    ///
    /// A reference without an id resolves to `None` without a lookup.
    pub fn resolve<L>(&self, lookup: &mut L) -> Result<Option<&T>, L::Error>
    where
        L: ExternalLookup<T> + ?Sized,
    {
        if let Some(value) = self.resolved.get() {
            return Ok(value.as_ref());
        }
        let value = match self.id.as_deref() {
            Some(id) => lookup.lookup_or_fetch(id, self.policy.get().try_fetch())?,
            None => None,
        };
        Ok(self.resolved.get_or_init(|| value).as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    struct Thing {
        id: String,
        key: String,
    }

    impl ExternalEntity for Thing {
        const KIND: &'static str = "thing";

        fn external_id(&self) -> &str {
            &self.id
        }

        fn external_key(&self) -> &str {
            &self.key
        }
    }

    #[derive(Default)]
    struct Lookup {
        known: HashMap<String, Thing>,
        calls: Vec<(String, bool)>,
    }

    impl ExternalLookup<Thing> for Lookup {
        type Error = String;

        fn lookup_or_fetch(&mut self, id: &str, try_fetch: bool) -> Result<Option<Thing>, String> {
            self.calls.push((id.to_owned(), try_fetch));
            if id == "broken" {
                return Err("unavailable".into());
            }
            Ok(self.known.get(id).cloned())
        }
    }

    fn thing(id: &str) -> Thing {
        Thing {
            id: id.into(),
            key: format!("K-{id}"),
        }
    }

    #[test]
    fn resolve_is_memoized() {
        let mut lookup = Lookup::default();
        lookup.known.insert("1".into(), thing("1"));

        let r = ExternalRef::<Thing>::new(Some("1".into()));
        assert_eq!(r.resolve(&mut lookup).unwrap(), Some(&thing("1")));
        assert_eq!(r.resolve(&mut lookup).unwrap(), Some(&thing("1")));
        assert_eq!(lookup.calls.len(), 1);
    }

    #[test]
    fn missing_id_resolves_to_none_without_lookup() {
        let mut lookup = Lookup::default();
        let r = ExternalRef::<Thing>::new(None);
        assert_eq!(r.resolve(&mut lookup).unwrap(), None);
        assert!(lookup.calls.is_empty());
    }

    #[test]
    fn bound_policy_is_passed_to_lookup() {
        let mut lookup = Lookup::default();
        let r = ExternalRef::<Thing>::new(Some("2".into()));
        r.bind(FetchPolicy::CacheOnly);
        assert_eq!(r.resolve(&mut lookup).unwrap(), None);
        assert_eq!(lookup.calls, vec![("2".to_owned(), false)]);
    }

    #[test]
    fn errors_are_not_memoized() {
        let mut lookup = Lookup::default();
        let r = ExternalRef::<Thing>::new(Some("broken".into()));
        assert!(r.resolve(&mut lookup).is_err());
        assert_eq!(r.resolved(), None);
    }

    #[test]
    fn set_id_resets_resolution() {
        let mut lookup = Lookup::default();
        lookup.known.insert("3".into(), thing("3"));

        let mut r = ExternalRef::new(None);
        r.assign(Some(&thing("1")));
        assert_eq!(r.id(), Some("1"));
        assert_eq!(r.resolved(), Some(Some(&thing("1"))));

        r.set_id(Some("3".into()));
        assert_eq!(r.resolved(), None);
        assert_eq!(r.resolve(&mut lookup).unwrap(), Some(&thing("3")));
    }
}

//! Bulk create-or-update of import records.
//!
//! [`bulk_create_update`] turns a sequence of import records of one kind
//! into tracked rows, in input order. Nested parent imports are handled
//! first by [`convert_imports`] for the parent kind, which deduplicates
//! them by etag so structurally equal parents are created once. Every
//! nested level runs with `skip_flush` set; only the outermost call flushes,
//! once, after its last record.

use std::collections::HashMap;

use tracing::{debug, info};

use mvtool_core::imports::ImportRecord;
use mvtool_core::iteration::{CachedIterable, IntoIter};
use mvtool_core::validation::ValidationError;
use mvtool_core::Key;
use mvtool_storage::Record;

use crate::context::DataContext;
use crate::error::{DataError, Result};
use crate::etag_map::EtagMap;

/// An entity kind that can be reconciled from import records.
pub trait Reconcile: Record {
    type Import: ImportRecord;

    /// Default parents for records that do not nest their own.
    type Fallback;

    /// Everything nested imports resolved to, shared by the whole batch.
    type Refs;

    /// Resolves the nested imports of the whole batch, e.g. by converting
    /// nested parents and fetching external entities in one call.
    fn resolve_refs<I>(
        cx: &mut DataContext<'_>,
        imports: &mut CachedIterable<Self::Import, I>,
        fallback: &Self::Fallback,
        patch: bool,
    ) -> Result<Self::Refs>
    where
        I: Iterator<Item = Self::Import>;

    /// Builds a new entity with its owning parent set.
    fn create(import: &Self::Import, refs: &Self::Refs, fallback: &Self::Fallback)
    -> Result<Self>;

    /// Copies the scalar fields of `import`. With `patch` only fields present
    /// in the record are copied; otherwise absent ones are reset.
    fn apply(entity: &mut Self, import: &Self::Import, patch: bool);

    /// Moves an existing entity to the parent nested in `import`, if any.
    /// A record without a nested parent never detaches the current one.
    fn reparent(_entity: &mut Self, _import: &Self::Import, _refs: &Self::Refs) {}

    /// Sets weak and external links. A link is rewritten, possibly to none,
    /// when the record mentions it or `patch` is off.
    fn link(
        _entity: &mut Self,
        _import: &Self::Import,
        _refs: &Self::Refs,
        _patch: bool,
    ) -> Result<()> {
        Ok(())
    }

    fn validate(entity: &Self) -> std::result::Result<(), ValidationError>;
}

/// Reconciles `imports` into rows of kind `R`.
///
/// Nested imports and the rows to update are resolved before this returns;
/// the records themselves are processed one by one as the returned iterator
/// is advanced. The iterator yields the key of each record in input order
/// and stops after the first error. Unless `skip_flush` is set the session
/// is flushed once when the iterator is exhausted, so a caller that stops
/// early must flush itself.
pub fn bulk_create_update<'a, 'c, R, S>(
    cx: &'a mut DataContext<'c>,
    imports: S,
    fallback: R::Fallback,
    patch: bool,
    skip_flush: bool,
) -> Result<Reconciled<'a, 'c, R, S::IntoIter>>
where
    R: Reconcile,
    S: IntoIterator<Item = R::Import>,
{
    let mut imports = CachedIterable::new(imports);
    let refs = R::resolve_refs(cx, &mut imports, &fallback, patch)?;

    let ids: Vec<i64> = imports.iter().filter_map(|import| import.id()).collect();
    let existing = if ids.is_empty() {
        HashMap::new()
    } else {
        cx.session.load_many_by_id::<R>(&ids)?
    };

    Ok(Reconciled {
        cx,
        imports: imports.into_iter(),
        refs,
        existing,
        fallback,
        patch,
        skip_flush,
        finished: false,
        created: 0,
        updated: 0,
    })
}

/// Lazy result of [`bulk_create_update`].
pub struct Reconciled<'a, 'c, R: Reconcile, I> {
    cx: &'a mut DataContext<'c>,
    imports: IntoIter<R::Import, I>,
    refs: R::Refs,
    existing: HashMap<i64, Key<R>>,
    fallback: R::Fallback,
    patch: bool,
    skip_flush: bool,
    finished: bool,
    created: usize,
    updated: usize,
}

impl<R, I> Reconciled<'_, '_, R, I>
where
    R: Reconcile,
{
    fn reconcile(&mut self, import: &R::Import) -> Result<Key<R>> {
        match import.id() {
            None => {
                let mut entity = R::create(import, &self.refs, &self.fallback)?;
                R::apply(&mut entity, import, false);
                R::link(&mut entity, import, &self.refs, false)?;
                R::validate(&entity)?;
                self.created += 1;
                Ok(self.cx.session.add(entity))
            }
            Some(id) => {
                let key = self
                    .existing
                    .get(&id)
                    .copied()
                    .ok_or_else(|| DataError::not_found(R::KIND, "id", id))?;
                let entity = self.cx.session.get_mut(key);
                R::apply(entity, import, self.patch);
                R::reparent(entity, import, &self.refs);
                R::link(entity, import, &self.refs, self.patch)?;
                R::validate(entity)?;
                self.updated += 1;
                debug!(kind = R::KIND, id, "updated from import");
                Ok(key)
            }
        }
    }
}

impl<R, I> Iterator for Reconciled<'_, '_, R, I>
where
    R: Reconcile,
    I: Iterator<Item = R::Import>,
{
    type Item = Result<Key<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let Some(import) = self.imports.next() else {
            self.finished = true;
            info!(
                kind = R::KIND,
                created = self.created,
                updated = self.updated,
                "reconciled imports"
            );
            if !self.skip_flush {
                if let Err(err) = self.cx.session.flush() {
                    return Some(Err(err.into()));
                }
            }
            return None;
        };
        let result = self.reconcile(&import);
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

/// Reconciles `imports` without flushing and returns the resulting keys by
/// etag.
///
/// Records with equal etags are reconciled once. A caller looks up its own
/// nested record with [`EtagMap::get_for`]; equal content is enough, it does
/// not have to be the same instance.
pub fn convert_imports<R, S>(
    cx: &mut DataContext<'_>,
    imports: S,
    fallback: R::Fallback,
    patch: bool,
) -> Result<EtagMap<Key<R>>>
where
    R: Reconcile,
    S: IntoIterator<Item = R::Import>,
{
    let by_etag: EtagMap<R::Import> = imports.into_iter().collect();
    if by_etag.is_empty() {
        return Ok(EtagMap::new());
    }
    let keys = bulk_create_update::<R, _>(cx, by_etag.values().cloned(), fallback, patch, true)?
        .collect::<Result<Vec<_>>>()?;
    Ok(by_etag.replace_values(keys))
}

// ---------------------------------------------------------------------------
// Helpers for the per-kind implementations
// ---------------------------------------------------------------------------

/// Copies an optional field following patch semantics: a present value
/// (null included) always wins, an absent one resets the target unless
/// patching.
pub(crate) fn assign<V: Clone>(target: &mut Option<V>, field: &Option<Option<V>>, patch: bool) {
    match field {
        Some(value) => *target = value.clone(),
        None if !patch => *target = None,
        None => {}
    }
}

/// Whether a link field is to be rewritten.
pub(crate) fn touches<V>(field: &Option<Option<V>>, patch: bool) -> bool {
    field.is_some() || !patch
}

/// Key a nested import resolved to.
pub(crate) fn nested_key<P, N: ImportRecord>(
    refs: &EtagMap<Key<P>>,
    nested: Option<&N>,
) -> Option<Key<P>> {
    nested.and_then(|import| refs.get_for(import).copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn assign_follows_patch_semantics() {
        let mut target = Some("old".to_owned());
        assign(&mut target, &None, true);
        assert_eq!(target.as_deref(), Some("old"));
        assign(&mut target, &None, false);
        assert_eq!(target, None);

        let mut target = Some("old".to_owned());
        assign(&mut target, &Some(None), true);
        assert_eq!(target, None);
        assign(&mut target, &Some(Some("new".to_owned())), true);
        assert_eq!(target.as_deref(), Some("new"));
    }

    #[test]
    fn links_are_touched_when_mentioned_or_replacing() {
        assert!(!touches::<i32>(&None, true));
        assert!(touches::<i32>(&None, false));
        assert!(touches::<i32>(&Some(None), true));
    }
}

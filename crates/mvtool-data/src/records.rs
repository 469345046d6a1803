//! Lookups and deletion shared by every record kind.
//!
//! Kinds with external links wrap these to bind how those links resolve,
//! see [`crate::projects`] and [`crate::measures`].

use mvtool_core::Key;
use mvtool_storage::{ListFilter, Record};
use tracing::info;

use crate::context::DataContext;
use crate::error::Result;

/// Loads the row with `id`, failing with NotFound if there is none.
pub fn get<R: Record>(cx: &mut DataContext<'_>, id: i64) -> Result<Key<R>> {
    Ok(cx.session.load::<R>(id)?)
}

/// Lists rows ordered by id.
pub fn list<R: Record>(cx: &mut DataContext<'_>, filter: &ListFilter) -> Result<Vec<Key<R>>> {
    Ok(cx.session.list::<R>(filter)?)
}

pub fn count<R: Record>(cx: &DataContext<'_>, filter: &ListFilter) -> Result<usize> {
    Ok(cx.session.count::<R>(filter)?)
}

/// Deletes the row behind `key` together with everything it owns.
///
/// Every other key handed out by the session is detached afterwards.
pub fn delete<R: Record>(cx: &mut DataContext<'_>, key: Key<R>) -> Result<()> {
    let id = cx.session.id_of(key);
    cx.session.delete(key)?;
    info!(kind = R::KIND, id, "deleted");
    Ok(())
}

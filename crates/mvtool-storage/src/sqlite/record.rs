//! Mapping between entity types and their tables.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Value;

use mvtool_core::Key;
use mvtool_core::enums::KnownValue;

use crate::error::{Result, StorageError};
use crate::sqlite::session::{Session, Table};

/// An entity type stored in its own table and tracked by a [`Session`].
///
/// Every table has `id`, `created` and `updated` columns in addition to
/// [`COLUMNS`](Record::COLUMNS), which lists the data columns in the order
/// produced by [`values`](Record::values).
pub trait Record: Sized {
    /// Human-readable kind used in messages, e.g. "catalog module".
    const KIND: &'static str;
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Foreign key column of the owning parent, if the kind has one.
    const PARENT_COLUMN: Option<&'static str>;

    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);
    fn created(&self) -> DateTime<Utc>;
    fn updated(&self) -> DateTime<Utc>;
    fn set_updated(&mut self, at: DateTime<Utc>);

    /// Loads every row referenced by a foreign key of the rows with the given
    /// ids, so that [`scan`](Record::scan) can turn those ids into keys.
    fn preload(session: &mut Session<'_>, ids: &[i64]) -> Result<()>;

    /// Builds an entity from a `SELECT *` row.
    fn scan(row: &Row<'_>, session: &Session<'_>) -> rusqlite::Result<Self>;

    /// Column values for insert and update, in [`COLUMNS`](Record::COLUMNS)
    /// order.
    fn values(&self, session: &Session<'_>) -> Result<Vec<Value>>;

    fn table<'s>(session: &'s Session<'_>) -> &'s Table<Self>;
    fn table_mut<'s>(session: &'s mut Session<'_>) -> &'s mut Table<Self>;
}

/// Implements the bookkeeping part of [`Record`] for an entity with the usual
/// `id`, `created` and `updated` fields.
macro_rules! record_bookkeeping {
    ($table_field:ident) => {
        fn id(&self) -> Option<i64> {
            self.id
        }

        fn set_id(&mut self, id: i64) {
            self.id = Some(id);
        }

        fn created(&self) -> chrono::DateTime<chrono::Utc> {
            self.created
        }

        fn updated(&self) -> chrono::DateTime<chrono::Utc> {
            self.updated
        }

        fn set_updated(&mut self, at: chrono::DateTime<chrono::Utc>) {
            self.updated = at;
        }

        fn table<'s>(
            session: &'s crate::sqlite::session::Session<'_>,
        ) -> &'s crate::sqlite::session::Table<Self> {
            &session.$table_field
        }

        fn table_mut<'s>(
            session: &'s mut crate::sqlite::session::Session<'_>,
        ) -> &'s mut crate::sqlite::session::Table<Self> {
            &mut session.$table_field
        }
    };
}

pub(crate) use record_bookkeeping;

/// Returns `?, ?, ...` with `n` placeholders.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

// ---------------------------------------------------------------------------
// Value helpers shared by the record implementations
// ---------------------------------------------------------------------------

pub(crate) fn text(value: &str) -> Value {
    Value::Text(value.to_owned())
}

pub(crate) fn opt_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, text)
}

pub(crate) fn opt_enum<E: KnownValue>(value: Option<&E>) -> Value {
    opt_text(value.map(KnownValue::as_str))
}

/// Id of a parent that must already have been written.
pub(crate) fn parent_id<P: Record>(session: &Session<'_>, key: Key<P>) -> Result<Value> {
    session.id_of(key).map(Value::Integer).ok_or_else(|| {
        StorageError::Internal(format!("{} written before its parent", P::KIND))
    })
}

pub(crate) fn opt_parent_id<P: Record>(
    session: &Session<'_>,
    key: Option<Key<P>>,
) -> Result<Value> {
    key.map_or(Ok(Value::Null), |key| parent_id(session, key))
}

/// Reads a nullable foreign key column and resolves it to a loaded key.
pub(crate) fn opt_link<P: Record>(
    row: &Row<'_>,
    session: &Session<'_>,
    column: &str,
) -> rusqlite::Result<Option<Key<P>>> {
    row.get::<_, Option<i64>>(column)?
        .map(|id| session.link::<P>(id))
        .transpose()
}

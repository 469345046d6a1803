//! Unit-of-work session over one connection.
//!
//! A [`Session`] keeps exactly one in-memory copy of every row it has loaded
//! or added (the identity map), hands out typed [`Key`]s to them, and writes
//! pending changes in one [`flush`](Session::flush). Rows are written parent
//! kinds first so a new child can point at a new parent that only got its
//! database id during the same flush.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use mvtool_core::Key;
use mvtool_core::catalog::{Catalog, CatalogModule, CatalogRequirement};
use mvtool_core::project::{Document, Measure, Project, Requirement};

use crate::error::{Result, StorageError};
use crate::sqlite::record::{Record, placeholders};

/// Largest number of ids bound into a single `IN (...)` list.
const MAX_BATCH: usize = 5000;

/// Lifecycle of a row tracked by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    /// Added but not written yet.
    New,
    /// Matches the database.
    Clean,
    /// Changed since it was loaded or last written.
    Dirty,
    /// Removed from the database, or added and dropped before it was written.
    Deleted,
    /// No longer tracked; the database may have changed underneath it.
    Detached,
}

struct Slot<T> {
    entity: T,
    state: RowState,
}

/// All tracked rows of one kind.
pub struct Table<T> {
    slots: Vec<Slot<T>>,
    by_id: HashMap<i64, Key<T>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            by_id: HashMap::new(),
        }
    }
}

impl<T> Table<T> {
    /// Number of tracked rows, detached and deleted ones included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn push(&mut self, entity: T, state: RowState) -> Key<T> {
        let key = Key::new(self.slots.len());
        self.slots.push(Slot { entity, state });
        key
    }

    fn slot(&self, key: Key<T>) -> &Slot<T> {
        &self.slots[key.index()]
    }

    fn slot_mut(&mut self, key: Key<T>) -> &mut Slot<T> {
        &mut self.slots[key.index()]
    }

    fn detach_all(&mut self) {
        for slot in &mut self.slots {
            if matches!(slot.state, RowState::Clean | RowState::Dirty) {
                slot.state = RowState::Detached;
            }
        }
        self.by_id.clear();
    }
}

/// Filter for [`Session::list`] and [`Session::count`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only rows owned by the parent with this id.
    pub parent_id: Option<i64>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListFilter {
    pub fn parent(parent_id: i64) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::default()
        }
    }
}

/// Unit of work bound to one connection, normally inside a transaction.
pub struct Session<'c> {
    conn: &'c Connection,
    pub(crate) catalogs: Table<Catalog>,
    pub(crate) catalog_modules: Table<CatalogModule>,
    pub(crate) catalog_requirements: Table<CatalogRequirement>,
    pub(crate) projects: Table<Project>,
    pub(crate) documents: Table<Document>,
    pub(crate) requirements: Table<Requirement>,
    pub(crate) measures: Table<Measure>,
    flushes: usize,
}

impl<'c> Session<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            catalogs: Table::default(),
            catalog_modules: Table::default(),
            catalog_requirements: Table::default(),
            projects: Table::default(),
            documents: Table::default(),
            requirements: Table::default(),
            measures: Table::default(),
            flushes: 0,
        }
    }

    /// The underlying connection, for queries the session does not cover.
    pub fn conn(&self) -> &'c Connection {
        self.conn
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    /// Returns the entity behind `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` was issued by another session.
    pub fn get<T: Record>(&self, key: Key<T>) -> &T {
        &T::table(self).slot(key).entity
    }

    /// Returns the entity behind `key` for modification and marks it dirty.
    pub fn get_mut<T: Record>(&mut self, key: Key<T>) -> &mut T {
        let slot = T::table_mut(self).slot_mut(key);
        if slot.state == RowState::Clean {
            slot.state = RowState::Dirty;
        }
        &mut slot.entity
    }

    pub fn state<T: Record>(&self, key: Key<T>) -> RowState {
        T::table(self).slot(key).state
    }

    /// Database id of the entity, `None` until it has been flushed.
    pub fn id_of<T: Record>(&self, key: Key<T>) -> Option<i64> {
        self.get(key).id()
    }

    /// Starts tracking a new entity. It is written by the next flush.
    pub fn add<T: Record>(&mut self, entity: T) -> Key<T> {
        T::table_mut(self).push(entity, RowState::New)
    }

    /// Number of flushes performed by this session.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Loads the row with the given id, `None` if it does not exist.
    pub fn load_by_id<T: Record>(&mut self, id: i64) -> Result<Option<Key<T>>> {
        Ok(self.load_many_by_id::<T>(&[id])?.remove(&id))
    }

    /// Loads the row with the given id or fails with
    /// [`StorageError::NotFound`].
    pub fn load<T: Record>(&mut self, id: i64) -> Result<Key<T>> {
        self.load_by_id::<T>(id)?
            .ok_or_else(|| StorageError::not_found(T::KIND, id.to_string()))
    }

    /// Loads all rows with the given ids. Ids without a row are left out of
    /// the result.
    ///
    /// Rows already tracked are served from the identity map; the rest are
    /// read with one batched query per kind, after their parents.
    pub fn load_many_by_id<T: Record>(&mut self, ids: &[i64]) -> Result<HashMap<i64, Key<T>>> {
        let mut found = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();
        {
            let table = T::table(self);
            for &id in ids {
                match table.by_id.get(&id) {
                    Some(&key) => {
                        found.insert(id, key);
                    }
                    None => missing.push(id),
                }
            }
        }
        missing.sort_unstable();
        missing.dedup();
        if missing.is_empty() {
            return Ok(found);
        }

        T::preload(self, &missing)?;

        let conn = self.conn;
        let this: &Session<'c> = self;
        let mut entities = Vec::with_capacity(missing.len());
        for chunk in missing.chunks(MAX_BATCH) {
            let sql = format!(
                "SELECT * FROM {} WHERE id IN ({})",
                T::TABLE,
                placeholders(chunk.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| T::scan(row, this))?;
            for row in rows {
                entities.push(row?);
            }
        }
        debug!(
            kind = T::KIND,
            requested = ids.len(),
            loaded = entities.len(),
            "loaded rows"
        );

        let table = T::table_mut(self);
        for entity in entities {
            let Some(id) = entity.id() else {
                return Err(StorageError::Internal(format!("{} row without id", T::KIND)));
            };
            let key = table.push(entity, RowState::Clean);
            table.by_id.insert(id, key);
            found.insert(id, key);
        }
        Ok(found)
    }

    /// Loads the rows matching `filter`, ordered by id.
    pub fn list<T: Record>(&mut self, filter: &ListFilter) -> Result<Vec<Key<T>>> {
        let (clause, params) = where_clause::<T>(filter)?;
        let mut sql = format!("SELECT id FROM {}{clause} ORDER BY id", T::TABLE);
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = filter.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        } else if let Some(offset) = filter.offset {
            sql.push_str(&format!(" LIMIT -1 OFFSET {offset}"));
        }

        let ids = {
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| row.get::<_, i64>(0))?;
            rows.collect::<rusqlite::Result<Vec<i64>>>()?
        };
        let loaded = self.load_many_by_id::<T>(&ids)?;
        Ok(ids.iter().filter_map(|id| loaded.get(id).copied()).collect())
    }

    /// Lists the rows of `T` whose weak link `column` points at `id`.
    pub fn list_linked<T: Record>(&mut self, column: &str, id: i64) -> Result<Vec<Key<T>>> {
        let sql = format!("SELECT id FROM {} WHERE {column} = ?1 ORDER BY id", T::TABLE);
        let ids = {
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map([id], |row| row.get::<_, i64>(0))?;
            rows.collect::<rusqlite::Result<Vec<i64>>>()?
        };
        let loaded = self.load_many_by_id::<T>(&ids)?;
        Ok(ids.iter().filter_map(|id| loaded.get(id).copied()).collect())
    }

    /// Counts the rows matching `filter`, ignoring limit and offset.
    pub fn count<T: Record>(&self, filter: &ListFilter) -> Result<usize> {
        let (clause, params) = where_clause::<T>(filter)?;
        let sql = format!("SELECT COUNT(*) FROM {}{clause}", T::TABLE);
        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Returns the key of an already loaded row. Used by [`Record::scan`] to
    /// resolve foreign keys after [`Record::preload`].
    pub fn link<P: Record>(&self, id: i64) -> rusqlite::Result<Key<P>> {
        P::table(self).by_id.get(&id).copied().ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Integer,
                format!("{} {id} is not loaded", P::KIND).into(),
            )
        })
    }

    /// Returns the distinct non-null values of `column` over the rows of
    /// `T` with the given ids.
    pub fn foreign_ids<T: Record>(&self, column: &str, ids: &[i64]) -> Result<Vec<i64>> {
        let mut out = Vec::new();
        for chunk in ids.chunks(MAX_BATCH) {
            let sql = format!(
                "SELECT DISTINCT {column} FROM {} WHERE id IN ({}) AND {column} IS NOT NULL",
                T::TABLE,
                placeholders(chunk.len())
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| row.get::<_, i64>(0))?;
            for row in rows {
                out.push(row?);
            }
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    /// Writes all new and dirty rows, parent kinds first.
    pub fn flush(&mut self) -> Result<()> {
        let now = Utc::now();
        let mut written = 0;
        written += self.flush_table::<Catalog>(now)?;
        written += self.flush_table::<CatalogModule>(now)?;
        written += self.flush_table::<CatalogRequirement>(now)?;
        written += self.flush_table::<Project>(now)?;
        written += self.flush_table::<Document>(now)?;
        written += self.flush_table::<Requirement>(now)?;
        written += self.flush_table::<Measure>(now)?;
        self.flushes += 1;
        debug!(written, flushes = self.flushes, "flushed session");
        Ok(())
    }

    fn flush_table<T: Record>(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let pending: Vec<(Key<T>, RowState, Vec<Value>)> = {
            let table = T::table(self);
            let mut pending = Vec::new();
            for (index, slot) in table.slots.iter().enumerate() {
                if matches!(slot.state, RowState::New | RowState::Dirty) {
                    pending.push((Key::new(index), slot.state, slot.entity.values(self)?));
                }
            }
            pending
        };

        let written = pending.len();
        for (key, state, mut values) in pending {
            if state == RowState::New {
                let (created, updated) = {
                    let entity = self.get(key);
                    (entity.created(), entity.updated())
                };
                values.push(Value::Text(format_datetime(&created)));
                values.push(Value::Text(format_datetime(&updated)));
                let sql = format!(
                    "INSERT INTO {} ({}, created, updated) VALUES ({})",
                    T::TABLE,
                    T::COLUMNS.join(", "),
                    placeholders(T::COLUMNS.len() + 2)
                );
                self.conn.execute(&sql, params_from_iter(values.iter()))?;
                let id = self.conn.last_insert_rowid();

                let table = T::table_mut(self);
                let slot = table.slot_mut(key);
                slot.entity.set_id(id);
                slot.state = RowState::Clean;
                table.by_id.insert(id, key);
            } else {
                let id = self.id_of(key).ok_or_else(|| {
                    StorageError::Internal(format!("dirty {} without id", T::KIND))
                })?;
                values.push(Value::Text(format_datetime(&now)));
                values.push(Value::Integer(id));
                let assignments: Vec<String> = T::COLUMNS
                    .iter()
                    .enumerate()
                    .map(|(i, column)| format!("{column} = ?{}", i + 1))
                    .collect();
                let sql = format!(
                    "UPDATE {} SET {}, updated = ?{} WHERE id = ?{}",
                    T::TABLE,
                    assignments.join(", "),
                    T::COLUMNS.len() + 1,
                    T::COLUMNS.len() + 2
                );
                self.conn.execute(&sql, params_from_iter(values.iter()))?;

                let slot = T::table_mut(self).slot_mut(key);
                slot.entity.set_updated(now);
                slot.state = RowState::Clean;
            }
        }
        Ok(written)
    }

    /// Deletes the row behind `key`.
    ///
    /// Pending changes are flushed first. Owned children are removed by the
    /// database and weak links to the row are cleared, so every other tracked
    /// row is detached afterwards and must be loaded again to be used.
    pub fn delete<T: Record>(&mut self, key: Key<T>) -> Result<()> {
        match self.state(key) {
            RowState::New => {
                T::table_mut(self).slot_mut(key).state = RowState::Deleted;
                return Ok(());
            }
            RowState::Deleted | RowState::Detached => {
                return Err(StorageError::Internal(format!(
                    "{} is no longer tracked",
                    T::KIND
                )));
            }
            RowState::Clean | RowState::Dirty => {}
        }

        self.flush()?;
        let id = self
            .id_of(key)
            .ok_or_else(|| StorageError::Internal(format!("{} without id", T::KIND)))?;
        let sql = format!("DELETE FROM {} WHERE id = ?1", T::TABLE);
        let deleted = self.conn.execute(&sql, [id])?;
        if deleted == 0 {
            return Err(StorageError::not_found(T::KIND, id.to_string()));
        }
        debug!(kind = T::KIND, id, "deleted row");

        T::table_mut(self).slot_mut(key).state = RowState::Deleted;
        self.detach_all();
        Ok(())
    }

    fn detach_all(&mut self) {
        self.catalogs.detach_all();
        self.catalog_modules.detach_all();
        self.catalog_requirements.detach_all();
        self.projects.detach_all();
        self.documents.detach_all();
        self.requirements.detach_all();
        self.measures.detach_all();
    }
}

fn where_clause<T: Record>(filter: &ListFilter) -> Result<(String, Vec<i64>)> {
    match (filter.parent_id, T::PARENT_COLUMN) {
        (None, _) => Ok((String::new(), Vec::new())),
        (Some(parent_id), Some(column)) => Ok((format!(" WHERE {column} = ?1"), vec![parent_id])),
        (Some(_), None) => Err(StorageError::validation(format!(
            "{} has no parent to filter by",
            T::KIND
        ))),
    }
}

/// Formats a timestamp as ISO 8601 TEXT for SQLite.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parses an ISO 8601 TEXT string from SQLite into a `DateTime<Utc>`.
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>().unwrap_or_else(|_| {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
            .map(|ndt| ndt.and_utc())
            .unwrap_or_else(|_| Utc::now())
    })
}

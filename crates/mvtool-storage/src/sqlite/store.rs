//! [`SqliteStore`] -- SQLite-backed storage.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::sqlite::schema;
use crate::sqlite::session::Session;

/// SQLite database holding all mvtool entities.
///
/// All reads and writes go through a [`Session`] handed out by
/// [`run_in_transaction`], one transaction at a time.
///
/// [`run_in_transaction`]: SqliteStore::run_in_transaction
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens the database file at `path`, creating it and its tables if
    /// needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening database");
        let conn = Connection::open(path).map_err(|e| {
            StorageError::Connection(format!("cannot open {}: {e}", path.display()))
        })?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("cannot open in-memory db: {e}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| StorageError::Connection(format!("cannot configure connection: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Version recorded in `metadata`, 0 for a database without tables.
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.lock_conn()?;
        Ok(read_schema_version(&conn))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock_conn()?;
        let version = read_schema_version(&conn);
        if version >= schema::CURRENT_SCHEMA_VERSION {
            debug!(version, "schema is current");
            return Ok(());
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;
        for statement in schema::SCHEMA_STATEMENTS {
            tx.execute_batch(statement)
                .map_err(|e| StorageError::Schema(e.to_string()))?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
            [schema::CURRENT_SCHEMA_VERSION.to_string()],
        )
        .map_err(|e| StorageError::Schema(e.to_string()))?;
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;

        info!(from = version, to = schema::CURRENT_SCHEMA_VERSION, "created schema");
        Ok(())
    }

    /// Runs `f` with a fresh [`Session`] inside a transaction.
    ///
    /// Commits if `f` returns `Ok`; any error rolls the transaction back.
    /// Pending session changes are not flushed implicitly.
    pub fn run_in_transaction<R, E, F>(&self, f: F) -> std::result::Result<R, E>
    where
        F: FnOnce(Session<'_>) -> std::result::Result<R, E>,
        E: From<StorageError>,
    {
        self.transaction_impl(true, f)
    }

    /// Like [`run_in_transaction`](Self::run_in_transaction) but always rolls
    /// back, so `f` can report what it would have written.
    pub fn run_in_dry_transaction<R, E, F>(&self, f: F) -> std::result::Result<R, E>
    where
        F: FnOnce(Session<'_>) -> std::result::Result<R, E>,
        E: From<StorageError>,
    {
        self.transaction_impl(false, f)
    }

    fn transaction_impl<R, E, F>(&self, commit: bool, f: F) -> std::result::Result<R, E>
    where
        F: FnOnce(Session<'_>) -> std::result::Result<R, E>,
        E: From<StorageError>,
    {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;

        // Transaction is rolled back on drop.
        let out = f(Session::new(&tx))?;

        if commit {
            tx.commit()
                .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        } else {
            debug!("dry run, rolling back");
            tx.rollback()
                .map_err(|e| StorageError::Transaction(format!("failed to roll back: {e}")))?;
        }
        Ok(out)
    }

    /// Acquires the connection lock.
    pub(crate) fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Connection(format!("mutex poisoned: {e}")))
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

/// Reads `schema_version` from `metadata`; a missing table or row counts as
/// version 0.
fn read_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT value FROM metadata WHERE key = 'schema_version'",
        [],
        |row| row.get::<_, String>(0),
    )
    .ok()
    .and_then(|value| value.parse().ok())
    .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvtool_core::catalog::Catalog;

    #[test]
    fn new_database_records_schema_version() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.schema_version().unwrap(), schema::CURRENT_SCHEMA_VERSION);
        store.init_schema().unwrap();
    }

    #[test]
    fn reopen_file_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mvtool.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .run_in_transaction(|mut session| {
                    session.add(Catalog::new("ISO 27001"));
                    session.flush()
                })
                .unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let conn = store.lock_conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn error_rolls_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result: Result<()> = store.run_in_transaction(|mut session| {
            session.add(Catalog::new("Discarded"));
            session.flush()?;
            Err(StorageError::validation("abort"))
        });
        assert!(result.is_err());

        let conn = store.lock_conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn dry_transaction_rolls_back() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store
            .run_in_dry_transaction(|mut session| -> Result<Option<i64>> {
                let key = session.add(Catalog::new("Preview"));
                session.flush()?;
                Ok(session.id_of(key))
            })
            .unwrap();
        assert!(id.is_some());

        let conn = store.lock_conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}

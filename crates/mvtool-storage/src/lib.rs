//! Storage backend for mvtool.
//!
//! Provides [`SqliteStore`] and the unit-of-work [`Session`] through which
//! entities are loaded, added, flushed and deleted.

pub mod error;
pub mod sqlite;

// Re-exports for convenience.
pub use error::{Result, StorageError};
pub use sqlite::SqliteStore;
pub use sqlite::record::Record;
pub use sqlite::session::{ListFilter, RowState, Session, Table};

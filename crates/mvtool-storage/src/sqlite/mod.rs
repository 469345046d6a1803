//! SQLite-backed storage implementation.

mod catalogs;
mod projects;
pub mod record;
pub mod schema;
pub mod session;
mod store;

pub use store::SqliteStore;

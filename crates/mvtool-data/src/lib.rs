//! Data layer of mvtool.
//!
//! Reconciles nested import records into the entity tree and offers the
//! single-record services (create, get, list, update, delete) the CLI is
//! built on. Everything runs against a [`DataContext`]: one storage session
//! plus the Jira caches of the current call.

pub mod catalogs;
pub mod context;
pub mod error;
pub mod etag_map;
pub mod fallback;
pub mod measures;
pub mod projects;
pub mod reconcile;
pub mod records;
pub mod requirements;

pub use context::DataContext;
pub use error::{DataError, Result};
pub use etag_map::EtagMap;
pub use measures::MeasureFallback;
pub use reconcile::{Reconcile, Reconciled, bulk_create_update, convert_imports};
pub use requirements::RequirementFallback;

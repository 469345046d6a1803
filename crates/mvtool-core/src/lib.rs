//! Core types for mvtool.
//!
//! Holds the persisted entity model (catalogs, projects and everything they
//! own), the import records used by bulk reconciliation, the Jira models,
//! and the small building blocks shared by the storage and data crates:
//! typed session keys, content etags, replayable iteration and lazily
//! resolved external references.

pub mod catalog;
pub mod enums;
pub mod etag;
pub mod external;
pub mod hints;
pub mod imports;
pub mod inputs;
pub mod iteration;
pub mod jira;
pub mod jsonl;
pub mod key;
pub mod project;
pub mod validation;

pub use etag::Etag;
pub use external::{ExternalEntity, ExternalLookup, ExternalRef, FetchPolicy};
pub use iteration::CachedIterable;
pub use key::Key;

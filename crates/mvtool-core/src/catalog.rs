//! Catalog hierarchy: a catalog owns modules, a module owns requirements.

use chrono::{DateTime, Utc};

use crate::enums::GsAbsicherung;
use crate::key::Key;

/// A published requirement catalog, e.g. a standard or a baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    /// Database id; `None` until the row has been flushed.
    pub id: Option<i64>,
    pub reference: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Catalog {
    /// Creates an unsaved catalog with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            reference: None,
            title: title.into(),
            description: None,
            created: now,
            updated: now,
        }
    }
}

/// A chapter of a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogModule {
    pub id: Option<i64>,
    pub reference: Option<String>,
    pub title: String,
    pub description: Option<String>,
    /// Owning catalog.
    pub catalog: Key<Catalog>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl CatalogModule {
    pub fn new(title: impl Into<String>, catalog: Key<Catalog>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            reference: None,
            title: title.into(),
            description: None,
            catalog,
            created: now,
            updated: now,
        }
    }
}

/// A single requirement published in a catalog module.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRequirement {
    pub id: Option<i64>,
    pub reference: Option<String>,
    pub summary: String,
    pub description: Option<String>,
    pub gs_absicherung: Option<GsAbsicherung>,
    pub gs_verantwortliche: Option<String>,
    /// Owning module.
    pub catalog_module: Key<CatalogModule>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl CatalogRequirement {
    pub fn new(summary: impl Into<String>, catalog_module: Key<CatalogModule>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            reference: None,
            summary: summary.into(),
            description: None,
            gs_absicherung: None,
            gs_verantwortliche: None,
            catalog_module,
            created: now,
            updated: now,
        }
    }
}

//! Table mappings for catalogs, catalog modules and catalog requirements.

use rusqlite::Row;
use rusqlite::types::Value;

use mvtool_core::catalog::{Catalog, CatalogModule, CatalogRequirement};
use mvtool_core::enums::GsAbsicherung;

use crate::error::Result;
use crate::sqlite::record::{
    Record, opt_enum, opt_text, parent_id, record_bookkeeping, text,
};
use crate::sqlite::session::{Session, parse_datetime};

impl Record for Catalog {
    const KIND: &'static str = "catalog";
    const TABLE: &'static str = "catalog";
    const COLUMNS: &'static [&'static str] = &["reference", "title", "description"];
    const PARENT_COLUMN: Option<&'static str> = None;

    record_bookkeeping!(catalogs);

    fn preload(_session: &mut Session<'_>, _ids: &[i64]) -> Result<()> {
        Ok(())
    }

    fn scan(row: &Row<'_>, _session: &Session<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            reference: row.get("reference")?,
            title: row.get("title")?,
            description: row.get("description")?,
            created: parse_datetime(&row.get::<_, String>("created")?),
            updated: parse_datetime(&row.get::<_, String>("updated")?),
        })
    }

    fn values(&self, _session: &Session<'_>) -> Result<Vec<Value>> {
        Ok(vec![
            opt_text(self.reference.as_deref()),
            text(&self.title),
            opt_text(self.description.as_deref()),
        ])
    }
}

impl Record for CatalogModule {
    const KIND: &'static str = "catalog module";
    const TABLE: &'static str = "catalog_module";
    const COLUMNS: &'static [&'static str] = &["reference", "title", "description", "catalog_id"];
    const PARENT_COLUMN: Option<&'static str> = Some("catalog_id");

    record_bookkeeping!(catalog_modules);

    fn preload(session: &mut Session<'_>, ids: &[i64]) -> Result<()> {
        let catalog_ids = session.foreign_ids::<Self>("catalog_id", ids)?;
        session.load_many_by_id::<Catalog>(&catalog_ids)?;
        Ok(())
    }

    fn scan(row: &Row<'_>, session: &Session<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            reference: row.get("reference")?,
            title: row.get("title")?,
            description: row.get("description")?,
            catalog: session.link(row.get("catalog_id")?)?,
            created: parse_datetime(&row.get::<_, String>("created")?),
            updated: parse_datetime(&row.get::<_, String>("updated")?),
        })
    }

    fn values(&self, session: &Session<'_>) -> Result<Vec<Value>> {
        Ok(vec![
            opt_text(self.reference.as_deref()),
            text(&self.title),
            opt_text(self.description.as_deref()),
            parent_id(session, self.catalog)?,
        ])
    }
}

impl Record for CatalogRequirement {
    const KIND: &'static str = "catalog requirement";
    const TABLE: &'static str = "catalog_requirement";
    const COLUMNS: &'static [&'static str] = &[
        "reference",
        "summary",
        "description",
        "gs_absicherung",
        "gs_verantwortliche",
        "catalog_module_id",
    ];
    const PARENT_COLUMN: Option<&'static str> = Some("catalog_module_id");

    record_bookkeeping!(catalog_requirements);

    fn preload(session: &mut Session<'_>, ids: &[i64]) -> Result<()> {
        let module_ids = session.foreign_ids::<Self>("catalog_module_id", ids)?;
        session.load_many_by_id::<CatalogModule>(&module_ids)?;
        Ok(())
    }

    fn scan(row: &Row<'_>, session: &Session<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            reference: row.get("reference")?,
            summary: row.get("summary")?,
            description: row.get("description")?,
            gs_absicherung: row
                .get::<_, Option<String>>("gs_absicherung")?
                .map(GsAbsicherung::from),
            gs_verantwortliche: row.get("gs_verantwortliche")?,
            catalog_module: session.link(row.get("catalog_module_id")?)?,
            created: parse_datetime(&row.get::<_, String>("created")?),
            updated: parse_datetime(&row.get::<_, String>("updated")?),
        })
    }

    fn values(&self, session: &Session<'_>) -> Result<Vec<Value>> {
        Ok(vec![
            opt_text(self.reference.as_deref()),
            text(&self.summary),
            opt_text(self.description.as_deref()),
            opt_enum(self.gs_absicherung.as_ref()),
            opt_text(self.gs_verantwortliche.as_deref()),
            parent_id(session, self.catalog_module)?,
        ])
    }
}

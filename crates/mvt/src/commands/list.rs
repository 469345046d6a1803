//! `mvt list` -- list stored records of one kind.

use anyhow::Result;
use mvtool_core::Key;
use mvtool_core::catalog::{Catalog, CatalogModule, CatalogRequirement};
use mvtool_core::project::{Document, Measure, Project, Requirement};
use mvtool_data::measures::list_measures;
use mvtool_data::projects::list_projects;
use mvtool_data::{DataContext, records};
use mvtool_storage::ListFilter;

use super::with_data;
use crate::cli::{Kind, ListArgs};
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};
use crate::views::Viewable;

type Lister<R> = fn(&mut DataContext<'_>, &ListFilter) -> mvtool_data::Result<Vec<Key<R>>>;

/// Execute the `mvt list` command.
pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    let filter = ListFilter {
        parent_id: args.parent,
        limit: args.limit,
        offset: args.offset,
    };
    match args.kind {
        Kind::Catalogs => list::<Catalog>(ctx, &filter, records::list),
        Kind::CatalogModules => list::<CatalogModule>(ctx, &filter, records::list),
        Kind::CatalogRequirements => list::<CatalogRequirement>(ctx, &filter, records::list),
        Kind::Projects => list::<Project>(ctx, &filter, list_projects),
        Kind::Documents => list::<Document>(ctx, &filter, records::list),
        Kind::Requirements => list::<Requirement>(ctx, &filter, records::list),
        Kind::Measures => list::<Measure>(ctx, &filter, list_measures),
    }
}

fn list<R: Viewable>(ctx: &RuntimeContext, filter: &ListFilter, lister: Lister<R>) -> Result<()> {
    let config = ctx.config()?;
    let json = ctx.json;
    let rendered = with_data(ctx, &config, false, |cx| {
        let keys = lister(cx, filter)?;
        if json {
            let views = keys
                .into_iter()
                .map(|key| R::view(cx, key))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Listing::Json(serde_json::to_value(views)?));
        }
        let mut rows = Vec::with_capacity(keys.len());
        for key in keys {
            let id = cx.session.id_of(key).unwrap_or_default();
            rows.push(vec![id.to_string(), cx.session.get(key).label().to_owned()]);
        }
        Ok(Listing::Table(rows))
    })?;

    match rendered {
        Listing::Json(value) => output_json(&value)?,
        Listing::Table(rows) if rows.is_empty() => {
            if !ctx.quiet {
                println!("No {} found.", R::KIND);
            }
        }
        Listing::Table(rows) => output_table(&["ID", R::LABEL], &rows),
    }
    Ok(())
}

enum Listing {
    Json(serde_json::Value),
    Table(Vec<Vec<String>>),
}

//! `mvt show` -- show one record.

use anyhow::Result;
use mvtool_core::Key;
use mvtool_core::catalog::{Catalog, CatalogModule, CatalogRequirement};
use mvtool_core::project::{Document, Measure, Project, Requirement};
use mvtool_data::measures::get_measure;
use mvtool_data::projects::get_project;
use mvtool_data::{DataContext, records};

use super::with_data;
use crate::cli::{Kind, ShowArgs};
use crate::context::RuntimeContext;
use crate::output::{format_fields, output_json};
use crate::views::Viewable;

type Getter<R> = fn(&mut DataContext<'_>, i64) -> mvtool_data::Result<Key<R>>;

/// Execute the `mvt show` command.
pub fn run(ctx: &RuntimeContext, args: &ShowArgs) -> Result<()> {
    match args.kind {
        Kind::Catalogs => show::<Catalog>(ctx, args.id, records::get),
        Kind::CatalogModules => show::<CatalogModule>(ctx, args.id, records::get),
        Kind::CatalogRequirements => show::<CatalogRequirement>(ctx, args.id, records::get),
        Kind::Projects => show::<Project>(ctx, args.id, get_project),
        Kind::Documents => show::<Document>(ctx, args.id, records::get),
        Kind::Requirements => show::<Requirement>(ctx, args.id, records::get),
        Kind::Measures => show::<Measure>(ctx, args.id, get_measure),
    }
}

fn show<R: Viewable>(ctx: &RuntimeContext, id: i64, getter: Getter<R>) -> Result<()> {
    let config = ctx.config()?;
    let view = with_data(ctx, &config, false, |cx| {
        let key = getter(cx, id)?;
        Ok(serde_json::to_value(R::view(cx, key)?)?)
    })?;

    if ctx.json {
        output_json(&view)?;
    } else {
        println!("{}", format_fields(&view));
    }
    Ok(())
}

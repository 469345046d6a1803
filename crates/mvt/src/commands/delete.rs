//! `mvt delete` -- delete a record and everything it owns.

use anyhow::{Result, bail};
use mvtool_core::catalog::{Catalog, CatalogModule, CatalogRequirement};
use mvtool_core::project::{Document, Measure, Project, Requirement};
use mvtool_data::records;
use mvtool_storage::Record;

use super::with_data;
use crate::cli::{DeleteArgs, Kind};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `mvt delete` command.
pub fn run(ctx: &RuntimeContext, args: &DeleteArgs) -> Result<()> {
    if !args.force {
        bail!(
            "refusing to delete without --force\n\
            Deleting removes everything the record owns."
        );
    }
    match args.kind {
        Kind::Catalogs => delete::<Catalog>(ctx, args.id),
        Kind::CatalogModules => delete::<CatalogModule>(ctx, args.id),
        Kind::CatalogRequirements => delete::<CatalogRequirement>(ctx, args.id),
        Kind::Projects => delete::<Project>(ctx, args.id),
        Kind::Documents => delete::<Document>(ctx, args.id),
        Kind::Requirements => delete::<Requirement>(ctx, args.id),
        Kind::Measures => delete::<Measure>(ctx, args.id),
    }
}

fn delete<R: Record>(ctx: &RuntimeContext, id: i64) -> Result<()> {
    let config = ctx.config()?;
    with_data(ctx, &config, false, |cx| {
        let key = records::get::<R>(cx, id)?;
        records::delete(cx, key)?;
        Ok(())
    })?;

    if ctx.json {
        output_json(&serde_json::json!({ "deleted": id, "kind": R::KIND }))?;
    } else if !ctx.quiet {
        println!("Deleted {} {id}", R::KIND);
    }
    Ok(())
}

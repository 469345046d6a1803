//! `mvt import` -- create or update records from a JSONL file.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use mvtool_config::MvtoolConfig;
use mvtool_core::catalog::{Catalog, CatalogModule, CatalogRequirement};
use mvtool_core::Key;
use mvtool_core::jsonl::read_jsonl;
use mvtool_core::project::{Document, Measure, Project, Requirement};
use mvtool_data::{
    DataContext, MeasureFallback, Reconcile, RequirementFallback, bulk_create_update, records,
};
use mvtool_storage::Record;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::with_data;
use crate::cli::{ImportArgs, Kind};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Summary printed after an import.
#[derive(Debug, Serialize)]
struct ImportSummary {
    kind: &'static str,
    count: usize,
    /// Ids of the imported records, in input order.
    ids: Vec<i64>,
    dry_run: bool,
}

/// Execute the `mvt import` command.
pub fn run(ctx: &RuntimeContext, args: &ImportArgs) -> Result<()> {
    let config = ctx.config()?;
    let summary = match args.kind {
        Kind::Catalogs => import::<Catalog>(ctx, &config, args, |_| Ok(()))?,
        Kind::CatalogModules => import::<CatalogModule>(ctx, &config, args, |cx| {
            fallback::<Catalog>(cx, args.catalog)
        })?,
        Kind::CatalogRequirements => import::<CatalogRequirement>(ctx, &config, args, |cx| {
            fallback::<CatalogModule>(cx, args.catalog_module)
        })?,
        Kind::Projects => import::<Project>(ctx, &config, args, |_| Ok(()))?,
        Kind::Documents => import::<Document>(ctx, &config, args, |cx| {
            fallback::<Project>(cx, args.project)
        })?,
        Kind::Requirements => import::<Requirement>(ctx, &config, args, |cx| {
            Ok(RequirementFallback {
                project: fallback::<Project>(cx, args.project)?,
                catalog_module: fallback::<CatalogModule>(cx, args.catalog_module)?,
            })
        })?,
        Kind::Measures => import::<Measure>(ctx, &config, args, |cx| {
            Ok(MeasureFallback {
                requirement: fallback::<Requirement>(cx, args.requirement)?,
                catalog_module: fallback::<CatalogModule>(cx, args.catalog_module)?,
            })
        })?,
    };

    if ctx.json {
        output_json(&summary)?;
    } else if !ctx.quiet {
        let verb = if summary.dry_run {
            "Would import"
        } else {
            "Imported"
        };
        println!("{verb} {} {} record(s)", summary.count, summary.kind);
    }
    Ok(())
}

fn import<R>(
    ctx: &RuntimeContext,
    config: &MvtoolConfig,
    args: &ImportArgs,
    resolve_fallback: impl FnOnce(&mut DataContext<'_>) -> Result<R::Fallback>,
) -> Result<ImportSummary>
where
    R: Reconcile,
    R::Import: DeserializeOwned,
{
    let imports: Vec<R::Import> = read_imports(&args.file)?;
    debug!(kind = R::KIND, count = imports.len(), "read import records");
    let patch = config.import.patch && !args.full;

    let ids = with_data(ctx, config, args.dry_run, |cx| {
        let fallback = resolve_fallback(cx)?;
        let keys = bulk_create_update::<R, _>(cx, imports, fallback, patch, false)?
            .collect::<mvtool_data::Result<Vec<_>>>()?;
        keys.into_iter()
            .map(|key| {
                cx.session
                    .id_of(key)
                    .with_context(|| format!("{} was not stored", R::KIND))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    Ok(ImportSummary {
        kind: R::KIND,
        count: ids.len(),
        ids,
        dry_run: args.dry_run,
    })
}

/// Loads the fallback parent given on the command line, if any.
fn fallback<R: Record>(cx: &mut DataContext<'_>, id: Option<i64>) -> Result<Option<Key<R>>> {
    Ok(id.map(|id| records::get::<R>(cx, id)).transpose()?)
}

/// Reads every record of a JSONL file, `-` meaning stdin.
fn read_imports<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader: Box<dyn BufRead> = if path == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Box::new(BufReader::new(file))
    };
    read_jsonl(reader)
        .collect::<mvtool_core::jsonl::Result<Vec<T>>>()
        .with_context(|| format!("failed to read {}", path.display()))
}

//! `mvt requirements-from-catalog` -- copy catalog requirements into a project.

use anyhow::{Context, Result};
use mvtool_data::projects::get_project;
use mvtool_data::requirements::bulk_create_requirements_from_catalog_requirements;

use super::with_data;
use crate::cli::FromCatalogArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

/// Execute the `mvt requirements-from-catalog` command.
pub fn run(ctx: &RuntimeContext, args: &FromCatalogArgs) -> Result<()> {
    let config = ctx.config()?;
    let created = with_data(ctx, &config, false, |cx| {
        let project = get_project(cx, args.project)?;
        let keys = bulk_create_requirements_from_catalog_requirements(cx, project, &args.ids)?;
        keys.into_iter()
            .map(|key| {
                let id = cx.session.id_of(key).context("requirement was not stored")?;
                Ok((id, cx.session.get(key).summary.clone()))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    if ctx.json {
        let ids: Vec<i64> = created.iter().map(|(id, _)| *id).collect();
        output_json(&serde_json::json!({ "project_id": args.project, "ids": ids }))?;
    } else if !ctx.quiet {
        println!(
            "Created {} requirement(s) in project {}",
            created.len(),
            args.project
        );
        let rows: Vec<Vec<String>> = created
            .into_iter()
            .map(|(id, summary)| vec![id.to_string(), summary])
            .collect();
        output_table(&["ID", "SUMMARY"], &rows);
    }
    Ok(())
}

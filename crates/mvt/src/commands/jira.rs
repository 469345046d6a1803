//! `mvt jira` -- Jira lookups through the configured connection.

use anyhow::Result;
use mvtool_data::DataError;
use mvtool_jira::Jira;

use crate::cli::{JiraArgs, JiraCommand};
use crate::context::RuntimeContext;
use crate::output::{format_fields, output_json, output_table};

/// Execute the `mvt jira` command.
pub fn run(ctx: &RuntimeContext, args: &JiraArgs) -> Result<()> {
    let config = ctx.config()?;
    let client = ctx.jira_client(&config);
    let mut jira = Jira::new(client.as_ref());

    match &args.command {
        JiraCommand::Projects => {
            let projects = jira.list_projects().map_err(DataError::from)?;
            if ctx.json {
                output_json(&projects)?;
            } else {
                let rows: Vec<Vec<String>> = projects
                    .iter()
                    .map(|p| vec![p.id.clone(), p.key.clone(), p.name.clone()])
                    .collect();
                output_table(&["ID", "KEY", "NAME"], &rows);
            }
        }
        JiraCommand::Issue { key } => {
            let issue = jira.get_issue(key).map_err(|err| {
                if err.is_not_found() {
                    DataError::not_found("Jira issue", "key", key)
                } else {
                    DataError::from(err)
                }
            })?;
            if ctx.json {
                output_json(&issue)?;
            } else {
                println!("{}", format_fields(&serde_json::to_value(&issue)?));
            }
        }
    }
    Ok(())
}

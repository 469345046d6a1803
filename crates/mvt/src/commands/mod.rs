//! Command implementations for the `mvt` CLI.

pub mod delete;
pub mod import;
pub mod init;
pub mod jira;
pub mod list;
pub mod requirements_from_catalog;
pub mod show;
pub mod version;

use anyhow::Result;
use mvtool_config::MvtoolConfig;
use mvtool_data::DataContext;
use mvtool_storage::Session;

use crate::context::RuntimeContext;

/// Runs `f` against the database in one transaction.
///
/// With `dry_run` the transaction is rolled back even when `f` succeeds.
pub fn with_data<T>(
    ctx: &RuntimeContext,
    config: &MvtoolConfig,
    dry_run: bool,
    f: impl FnOnce(&mut DataContext<'_>) -> Result<T>,
) -> Result<T> {
    let store = ctx.open_store(config)?;
    let client = ctx.jira_client(config);
    let run = |session: Session<'_>| {
        let mut cx = DataContext::new(session, client.as_ref());
        f(&mut cx)
    };
    if dry_run {
        store.run_in_dry_transaction(run)
    } else {
        store.run_in_transaction(run)
    }
}

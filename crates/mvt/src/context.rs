//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds the global flags and knows how to find the
//! `.mvtool/` directory, its configuration, the database and the Jira client.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use mvtool_config::{MvtoolConfig, find_mvtool_dir, find_mvtool_dir_or_error, load_config};
use mvtool_jira::{HttpJiraClient, JiraClient, JiraConnection, OfflineJira};
use mvtool_storage::SqliteStore;
use tracing::debug;

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Database path given on the command line.
    pub db_path: Option<PathBuf>,

    /// Whether to produce JSON output.
    pub json: bool,

    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

impl RuntimeContext {
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        Self {
            db_path: global.db.clone(),
            json: global.json,
            verbose: global.verbose,
            quiet: global.quiet,
        }
    }

    /// Discovers `.mvtool/` from the current directory.
    pub fn mvtool_dir(&self) -> Option<PathBuf> {
        let cwd = env::current_dir().ok()?;
        find_mvtool_dir(&cwd)
    }

    /// Loads the configuration, or the defaults when there is no `.mvtool/`.
    pub fn config(&self) -> Result<MvtoolConfig> {
        match self.mvtool_dir() {
            Some(dir) => load_config(&dir)
                .with_context(|| format!("failed to load config from {}", dir.display())),
            None => Ok(MvtoolConfig::default()),
        }
    }

    /// Returns the database path: `--db`, else the configured path.
    pub fn resolve_db_path(&self, config: &MvtoolConfig) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let cwd = env::current_dir().context("failed to get current directory")?;
        let dir = find_mvtool_dir_or_error(&cwd)?;
        Ok(config.database_path(&dir))
    }

    /// Opens the existing database.
    pub fn open_store(&self, config: &MvtoolConfig) -> Result<SqliteStore> {
        let path = self.resolve_db_path(config)?;
        if !path.exists() {
            bail!(
                "no mvtool database found at {}\nHint: run 'mvt init' to create a database",
                path.display()
            );
        }
        debug!(path = %path.display(), "opening database");
        SqliteStore::open(&path)
            .with_context(|| format!("failed to open database: {}", path.display()))
    }

    /// Builds the Jira client for `config`, offline when no Jira section is
    /// configured.
    pub fn jira_client(&self, config: &MvtoolConfig) -> Box<dyn JiraClient> {
        match &config.jira {
            Some(jira) => Box::new(HttpJiraClient::new(&JiraConnection {
                url: jira.url.clone(),
                username: jira.username.clone(),
                token: jira.token.clone(),
                verify_ssl: jira.verify_ssl,
                timeout: Duration::from_secs(jira.timeout_secs),
            })),
            None => Box::new(OfflineJira),
        }
    }
}

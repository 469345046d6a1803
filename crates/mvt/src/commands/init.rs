//! `mvt init` -- initialize mvtool in the current directory.

use std::env;
use std::fs;

use anyhow::{Context, Result, bail};
use mvtool_config::{CONFIG_FILE, MvtoolConfig, ensure_mvtool_dir, load_config, save_config};
use mvtool_storage::SqliteStore;
use tracing::info;

use crate::cli::InitArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Default gitignore content for the `.mvtool` directory.
const GITIGNORE_CONTENT: &str = "# mvtool database files
*.db
*.db-journal
*.db-wal
*.db-shm
";

/// Execute the `mvt init` command.
pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let cwd = env::current_dir().context("failed to get current directory")?;
    let mvtool_dir = ensure_mvtool_dir(&cwd)
        .with_context(|| format!("failed to create .mvtool in {}", cwd.display()))?;

    let config_path = mvtool_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        save_config(&mvtool_dir, &MvtoolConfig::default())
            .with_context(|| format!("failed to write {}", config_path.display()))?;
    }
    let config = load_config(&mvtool_dir)?;

    let gitignore_path = mvtool_dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(&gitignore_path, GITIGNORE_CONTENT).with_context(|| {
            format!("failed to create .gitignore: {}", gitignore_path.display())
        })?;
    }

    let db_path = match &ctx.db_path {
        Some(path) => path.clone(),
        None => config.database_path(&mvtool_dir),
    };
    if db_path.exists() {
        if !args.force {
            bail!(
                "Found existing database at {}\n\n\
                This directory is already initialized.\n\
                Use --force to re-initialize (data loss warning).",
                db_path.display()
            );
        }
        fs::remove_file(&db_path)
            .with_context(|| format!("failed to remove {}", db_path.display()))?;
    }

    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("failed to create database: {}", db_path.display()))?;
    let schema_version = store.schema_version()?;
    info!(path = %db_path.display(), schema_version, "initialized database");

    if ctx.json {
        output_json(&serde_json::json!({
            "mvtool_dir": mvtool_dir,
            "database": db_path,
            "schema_version": schema_version,
        }))?;
    } else if !ctx.quiet {
        println!("mvtool initialized successfully!");
        println!();
        println!("  Config:   {}", config_path.display());
        println!("  Database: {}", db_path.display());
        println!();
        println!("Run `mvt import catalogs <FILE.jsonl>` to get started.");
    }

    Ok(())
}

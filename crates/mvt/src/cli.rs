//! Clap CLI definitions for the `mvt` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// mvt -- compliance requirements, measures and their catalogs.
///
/// Bulk-imports nested JSONL records into an mvtool database and inspects
/// what is stored, optionally linked to Jira projects and issues.
#[derive(Parser, Debug)]
#[command(
    name = "mvt",
    about = "Manage compliance requirements and measures",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Database path (default: from .mvtool/config.yaml).
    #[arg(long, global = true, env = "MVTOOL_DB")]
    pub db: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize mvtool in the current directory.
    Init(InitArgs),

    /// Create or update records from a JSONL file.
    Import(ImportArgs),

    /// List stored records of one kind.
    List(ListArgs),

    /// Show one record.
    #[command(alias = "view")]
    Show(ShowArgs),

    /// Delete a record and everything it owns.
    Delete(DeleteArgs),

    /// Create project requirements from catalog requirements.
    #[command(name = "requirements-from-catalog")]
    RequirementsFromCatalog(FromCatalogArgs),

    /// Jira lookups.
    Jira(JiraArgs),

    /// Print version information.
    Version,
}

/// Record kinds addressable from the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Catalogs,
    CatalogModules,
    CatalogRequirements,
    Projects,
    Documents,
    Requirements,
    Measures,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Re-initialize even if a database already exists.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Kind of the records in the file.
    #[arg(value_enum)]
    pub kind: Kind,

    /// JSONL file with one import record per line ("-" for stdin).
    pub file: PathBuf,

    /// Catalog for modules that nest none.
    #[arg(long)]
    pub catalog: Option<i64>,

    /// Catalog module for catalog requirements that nest none.
    #[arg(long)]
    pub catalog_module: Option<i64>,

    /// Project for documents and requirements that nest none.
    #[arg(long)]
    pub project: Option<i64>,

    /// Requirement for measures that nest none.
    #[arg(long)]
    pub requirement: Option<i64>,

    /// Replace every field of updated records instead of patching.
    #[arg(long)]
    pub full: bool,

    /// Report what would be imported, then roll back.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(value_enum)]
    pub kind: Kind,

    /// Only records owned by the parent with this id.
    #[arg(long)]
    pub parent: Option<i64>,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long)]
    pub offset: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(value_enum)]
    pub kind: Kind,

    pub id: i64,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[arg(value_enum)]
    pub kind: Kind,

    pub id: i64,

    /// Confirm the deletion.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct FromCatalogArgs {
    /// Project receiving the new requirements.
    #[arg(long)]
    pub project: i64,

    /// Catalog requirement ids.
    #[arg(required = true)]
    pub ids: Vec<i64>,
}

#[derive(Args, Debug)]
pub struct JiraArgs {
    #[command(subcommand)]
    pub command: JiraCommand,
}

#[derive(Subcommand, Debug)]
pub enum JiraCommand {
    /// List the Jira projects visible to the configured user.
    Projects,

    /// Show a Jira issue.
    Issue {
        /// Issue key or id, e.g. ACME-12.
        key: String,
    },
}

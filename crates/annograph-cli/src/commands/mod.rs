//! CLI command definitions and dispatch.

pub mod folder;
pub mod merge;
pub mod migrate;
pub mod resync;

use std::str::FromStr;

use clap::{Parser, Subcommand};

use annograph_core::config::AppConfig;
use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_database::DatabasePool;
use annograph_graph::PgGraphStore;
use annograph_service::{RequestContext, Services, Stores};

use crate::output::OutputFormat;

/// AnnoGraph: permission-scoped circuit annotation graph
#[derive(Debug, Parser)]
#[command(name = "annograph", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding default.toml and the environment overlays
    #[arg(short, long, default_value = "config")]
    pub config_dir: String,

    /// Configuration environment overlay to apply
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Schema migrations for both stores
    Migrate(migrate::MigrateArgs),
    /// Re-derive graph node permissions from their folders
    Resync(resync::ResyncArgs),
    /// Inspect and decide merge requests
    Merge(merge::MergeArgs),
    /// Folder inspection
    Folder(folder::FolderArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config).await,
            Commands::Resync(args) => resync::execute(args, config, self.format).await,
            Commands::Merge(args) => merge::execute(args, config, self.format).await,
            Commands::Folder(args) => folder::execute(args, config, self.format).await,
        }
    }
}

/// Open both stores from configuration.
pub async fn connect(config: &AppConfig) -> AppResult<(DatabasePool, PgGraphStore)> {
    let db = DatabasePool::connect(&config.database).await?;
    let graph = PgGraphStore::connect(&config.graph).await?;
    Ok((db, graph))
}

/// Wire the services over freshly opened stores.
pub async fn services(config: &AppConfig) -> AppResult<(Stores, Services)> {
    let (db, graph) = connect(config).await?;
    let stores = Stores::postgres(&db, graph);
    let services = Services::new(&stores);
    Ok((stores, services))
}

/// Build a request context acting as the user with the given account.
pub async fn acting_as(stores: &Stores, account: &str) -> AppResult<RequestContext> {
    let user = stores
        .users
        .find_by_account(account)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No user with account '{account}'")))?;
    Ok(RequestContext::authenticated(user.auth()))
}

/// Parse a typed id from a command-line argument.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid {what} id: '{raw}'")))
}

/// Ask for confirmation unless `assume_yes` is set.
pub fn confirm(prompt: &str, assume_yes: bool) -> AppResult<bool> {
    if assume_yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::internal(format!("Input error: {e}")))
}

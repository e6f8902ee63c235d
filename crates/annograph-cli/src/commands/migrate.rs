//! Database migration management commands.

use clap::{Args, Subcommand};

use annograph_core::config::AppConfig;
use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_database::connection::mask_password;
use annograph_database::migration::run_migrations;

use crate::output;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Apply pending relational and graph migrations
    Run {
        /// Only migrate the relational store
        #[arg(long)]
        skip_graph: bool,
    },
    /// Check that the relational store is reachable
    Check,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> AppResult<()> {
    match &args.command {
        MigrateCommand::Run { skip_graph } => {
            let (db, graph) = super::connect(config).await?;

            println!("Running relational migrations...");
            run_migrations(db.pool()).await?;
            output::print_success("Relational migrations applied.");

            if *skip_graph {
                output::print_warning("Skipping graph migrations.");
            } else {
                println!("Running graph migrations...");
                graph.run_migrations().await?;
                output::print_success("Graph migrations applied.");
            }
            db.close().await;
        }
        MigrateCommand::Check => {
            let db = annograph_database::DatabasePool::connect(&config.database).await?;
            output::print_kv("database", &mask_password(&config.database.url));
            if db.health_check().await? {
                output::print_success("Database reachable.");
            } else {
                return Err(AppError::database("Database health check returned an unexpected value"));
            }
            db.close().await;
        }
    }

    Ok(())
}

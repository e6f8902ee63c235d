//! Folder inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use annograph_core::config::AppConfig;
use annograph_core::result::AppResult;
use annograph_entity::folder::Folder;

use crate::output::{self, OutputFormat};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// List the folders a user can see
    List {
        /// Account to list folders for
        #[arg(long = "as")]
        account: String,
    },
}

/// Folder display row
#[derive(Debug, Serialize, Tabled)]
struct FolderRow {
    /// Folder ID
    id: String,
    /// Folder name
    name: String,
    /// Space
    space: String,
    /// Owning user or organization
    owner: String,
    /// Merge state
    merge_state: String,
}

impl From<&Folder> for FolderRow {
    fn from(folder: &Folder) -> Self {
        let owner = folder
            .owner_organization_id
            .map(|id| format!("org:{id}"))
            .or_else(|| folder.owner_user_id.map(|id| format!("user:{id}")))
            .unwrap_or_else(|| "-".to_string());
        Self {
            id: folder.id.to_string(),
            name: folder.name.clone(),
            space: folder.space.to_string(),
            owner,
            merge_state: folder.merge_state.to_string(),
        }
    }
}

/// Execute folder commands
pub async fn execute(args: &FolderArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let (stores, services) = super::services(config).await?;

    match &args.command {
        FolderCommand::List { account } => {
            let ctx = super::acting_as(&stores, account).await?;
            let folders = services.folders.list_visible_folders(&ctx).await?;
            let rows: Vec<FolderRow> = folders.iter().map(FolderRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}

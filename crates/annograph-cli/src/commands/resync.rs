//! Graph permission repair commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use annograph_core::config::AppConfig;
use annograph_core::result::AppResult;
use annograph_core::types::FolderId;

use crate::output::{self, OutputFormat};

/// Arguments for resync commands
#[derive(Debug, Args)]
pub struct ResyncArgs {
    /// Resync subcommand
    #[command(subcommand)]
    pub command: ResyncCommand,
}

/// Resync subcommands
#[derive(Debug, Subcommand)]
pub enum ResyncCommand {
    /// Resync a single node by name (its image storage path)
    Node {
        /// Node name
        name: String,
    },
    /// Resync every node of a folder's images
    Folder {
        /// Folder ID
        folder_id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Node property display row
#[derive(Debug, Serialize, Tabled)]
struct PropertyRow {
    /// Property key
    key: String,
    /// Property value
    value: String,
}

/// Execute resync commands
pub async fn execute(args: &ResyncArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let (_, services) = super::services(config).await?;

    match &args.command {
        ResyncCommand::Node { name } => {
            let Some(node) = services.propagator.resync_node(name).await? else {
                output::print_warning(&format!(
                    "Node '{name}' had no live image and was removed."
                ));
                return Ok(());
            };
            let rows: Vec<PropertyRow> = node
                .properties
                .iter()
                .map(|(key, value)| PropertyRow {
                    key: key.clone(),
                    value: value.to_string(),
                })
                .collect();
            output::print_success(&format!("Node '{name}' resynced."));
            output::print_list(&rows, format);
        }
        ResyncCommand::Folder { folder_id, yes } => {
            let folder_id: FolderId = super::parse_id(folder_id, "folder")?;
            if !super::confirm(
                &format!("Rewrite permission properties on every node of folder {folder_id}?"),
                *yes,
            )? {
                println!("Cancelled.");
                return Ok(());
            }

            let summary = services.propagator.resync_folder(folder_id).await?;
            output::print_kv("updated", &summary.updated.to_string());
            output::print_kv("removed", &summary.removed.to_string());
            output::print_kv("failed", &summary.failed.len().to_string());
            for name in &summary.failed {
                output::print_warning(&format!("Failed: {name}"));
            }
            summary.into_result()?;
            output::print_success("Folder resynced.");
        }
    }

    Ok(())
}

//! Merge request commands for organization admins.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use annograph_core::config::AppConfig;
use annograph_core::result::AppResult;
use annograph_core::types::{FolderId, OrganizationId};
use annograph_service::PendingMerge;

use crate::output::{self, OutputFormat};

/// Arguments for merge commands
#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Merge subcommand
    #[command(subcommand)]
    pub command: MergeCommand,
}

/// Merge subcommands
#[derive(Debug, Subcommand)]
pub enum MergeCommand {
    /// List folders waiting to be merged into an organization
    List {
        /// Organization ID
        #[arg(long)]
        org: String,
        /// Account of the acting admin
        #[arg(long = "as")]
        account: String,
    },
    /// Approve a pending merge
    Approve {
        /// Folder ID
        folder_id: String,
        /// Account of the acting admin
        #[arg(long = "as")]
        account: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Reject a pending merge
    Reject {
        /// Folder ID
        folder_id: String,
        /// Account of the acting admin
        #[arg(long = "as")]
        account: String,
    },
}

/// Pending merge display row
#[derive(Debug, Serialize, Tabled)]
struct PendingRow {
    /// Folder ID
    folder_id: String,
    /// Folder name
    name: String,
    /// Requesting user
    requester: String,
    /// Last state change
    updated: String,
}

impl From<&PendingMerge> for PendingRow {
    fn from(pending: &PendingMerge) -> Self {
        let requester = pending
            .requester
            .as_ref()
            .map(|p| p.user_name.clone().unwrap_or_else(|| p.id.to_string()))
            .unwrap_or_else(|| "-".to_string());
        Self {
            folder_id: pending.folder.id.to_string(),
            name: pending.folder.name.clone(),
            requester,
            updated: pending.folder.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute merge commands
pub async fn execute(args: &MergeArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let (stores, services) = super::services(config).await?;

    match &args.command {
        MergeCommand::List { org, account } => {
            let org_id: OrganizationId = super::parse_id(org, "organization")?;
            let ctx = super::acting_as(&stores, account).await?;
            let pending = services.merges.list_pending_merges(&ctx, org_id).await?;
            let rows: Vec<PendingRow> = pending.iter().map(PendingRow::from).collect();
            output::print_list(&rows, format);
        }
        MergeCommand::Approve {
            folder_id,
            account,
            yes,
        } => {
            let folder_id: FolderId = super::parse_id(folder_id, "folder")?;
            let ctx = super::acting_as(&stores, account).await?;
            if !super::confirm(
                &format!("Approve merge of folder {folder_id}? Ownership moves to the organization."),
                *yes,
            )? {
                println!("Cancelled.");
                return Ok(());
            }
            let folder = services.merges.approve_merge_request(&ctx, folder_id).await?;
            output::print_success(&format!(
                "Folder '{}' merged ({}).",
                folder.name, folder.merge_state
            ));
        }
        MergeCommand::Reject { folder_id, account } => {
            let folder_id: FolderId = super::parse_id(folder_id, "folder")?;
            let ctx = super::acting_as(&stores, account).await?;
            let folder = services.merges.reject_merge_request(&ctx, folder_id).await?;
            output::print_success(&format!(
                "Merge of folder '{}' rejected ({}).",
                folder.name, folder.merge_state
            ));
        }
    }

    Ok(())
}

//! Merge-to-organization workflow.
//!
//! A `user_public` folder moves `NONE -> PENDING -> APPROVED | REJECTED`.
//! `REJECTED` may be requested again. Approval reassigns the folder to the
//! target organization in one relational transaction and then pushes the
//! new permission properties onto the graph nodes of its images. The graph
//! writes are not part of that transaction: a failure there is reported
//! as a graph error while the folder stays approved, and a folder resync
//! repairs the nodes.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use annograph_auth::PermissionEngine;
use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_core::types::{FolderId, OrganizationId};
use annograph_database::store::{FolderStore, OrganizationStore, UserStore};
use annograph_entity::folder::{Folder, Space};
use annograph_entity::permission::Permission;
use annograph_entity::user::UserProfile;

use crate::context::RequestContext;
use crate::graph::PermissionPropagator;

/// A pending merge paired with the profile of the user who asked for it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PendingMerge {
    /// The folder awaiting a decision.
    pub folder: Folder,
    /// Public profile of the requesting owner, when still available.
    pub requester: Option<UserProfile>,
}

/// Drives the merge state machine.
#[derive(Clone)]
pub struct MergeService {
    folders: Arc<dyn FolderStore>,
    organizations: Arc<dyn OrganizationStore>,
    users: Arc<dyn UserStore>,
    engine: PermissionEngine,
    propagator: PermissionPropagator,
}

impl std::fmt::Debug for MergeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergeService").finish_non_exhaustive()
    }
}

impl MergeService {
    /// Creates a new merge service.
    pub fn new(
        folders: Arc<dyn FolderStore>,
        organizations: Arc<dyn OrganizationStore>,
        users: Arc<dyn UserStore>,
        engine: PermissionEngine,
        propagator: PermissionPropagator,
    ) -> Self {
        Self {
            folders,
            organizations,
            users,
            engine,
            propagator,
        }
    }

    /// Ask for a folder to be merged into an organization.
    ///
    /// Only the owner (WRITE) may ask, only for `user_public` folders, and
    /// only from `NONE` or `REJECTED`.
    pub async fn request_merge(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        target: OrganizationId,
    ) -> AppResult<Folder> {
        let folder = self.find_live(folder_id).await?;
        self.engine
            .check_folder_permission(&folder, ctx.user(), Permission::Write)
            .await?;

        if folder.space != Space::UserPublic {
            return Err(AppError::validation(
                "Only user_public folders can be merged into an organization",
            ));
        }
        if !folder.merge_state.accepts_request() {
            return Err(AppError::invalid_state(format!(
                "Folder merge state is {}, a new request is not allowed",
                folder.merge_state
            )));
        }

        self.organizations
            .find_by_id(target)
            .await?
            .ok_or_else(|| AppError::not_found("Target organization not found"))?;

        let pending = self
            .folders
            .request_merge(folder_id, target)
            .await?
            .ok_or_else(|| AppError::invalid_state("Folder merge state changed concurrently"))?;

        info!(
            folder_id = %folder_id,
            org_id = %target,
            "Merge requested"
        );
        Ok(pending)
    }

    /// Pending merges into an organization, for its admins.
    pub async fn list_pending_merges(
        &self,
        ctx: &RequestContext,
        org_id: OrganizationId,
    ) -> AppResult<Vec<PendingMerge>> {
        self.engine
            .check_organization_admin(org_id, ctx.user())
            .await?;

        let folders = self.folders.list_pending_merges(org_id).await?;

        let mut requester_ids: Vec<_> = folders.iter().filter_map(|f| f.owner_user_id).collect();
        requester_ids.sort();
        requester_ids.dedup();
        let profiles: HashMap<_, _> = self
            .users
            .profiles(&requester_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(folders
            .into_iter()
            .map(|folder| {
                let requester = folder
                    .owner_user_id
                    .and_then(|id| profiles.get(&id).cloned());
                PendingMerge { folder, requester }
            })
            .collect())
    }

    /// Approve a pending merge and propagate the new ownership to the graph.
    ///
    /// The target organization must still exist.
    pub async fn approve_merge_request(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<Folder> {
        let (folder, target) = self.find_pending(ctx, folder_id).await?;
        self.organizations
            .find_by_id(target)
            .await?
            .ok_or_else(|| AppError::not_found("Target organization not found"))?;

        let approved = self
            .folders
            .approve_merge(folder.id)
            .await?
            .ok_or_else(|| AppError::invalid_state("Folder is no longer pending a merge"))?;

        info!(
            folder_id = %approved.id,
            org_id = %target,
            "Merge approved"
        );

        let summary = self.propagator.propagate_folder(&approved).await?;
        if !summary.is_complete() {
            error!(
                folder_id = %approved.id,
                failed = summary.failed.len(),
                "Merge approved but graph propagation was partial"
            );
        }
        summary.into_result()?;

        Ok(approved)
    }

    /// Reject a pending merge. Ownership and space are unchanged.
    pub async fn reject_merge_request(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<Folder> {
        let (folder, target) = self.find_pending(ctx, folder_id).await?;

        let rejected = self
            .folders
            .reject_merge(folder.id)
            .await?
            .ok_or_else(|| AppError::invalid_state("Folder is no longer pending a merge"))?;

        info!(folder_id = %rejected.id, org_id = %target, "Merge rejected");
        Ok(rejected)
    }

    async fn find_live(&self, folder_id: FolderId) -> AppResult<Folder> {
        self.folders
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Load a folder awaiting a decision by the caller.
    ///
    /// The caller must administer the folder's target organization (or be
    /// a platform admin when there is none) before its merge state is
    /// reported.
    async fn find_pending(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<(Folder, OrganizationId)> {
        let folder = self.find_live(folder_id).await?;
        match folder.target_organization_id {
            Some(target) => {
                self.engine
                    .check_organization_admin(target, ctx.user())
                    .await?
            }
            None => {
                PermissionEngine::require_platform_admin(ctx.user())?;
            }
        }

        if !folder.is_merge_pending() {
            return Err(AppError::invalid_state(format!(
                "Folder merge state is {}, expected PENDING",
                folder.merge_state
            )));
        }
        let target = folder
            .target_organization_id
            .ok_or_else(|| AppError::internal("Pending folder has no target organization"))?;
        Ok((folder, target))
    }
}

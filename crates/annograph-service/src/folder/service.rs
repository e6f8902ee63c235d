//! Folder CRUD operations with permission enforcement.

use std::sync::Arc;

use tracing::{error, info};

use annograph_auth::PermissionEngine;
use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_core::types::{FolderId, OrganizationId};
use annograph_database::store::{FolderStore, ImageStore, MembershipStore, OrganizationStore};
use annograph_entity::folder::{CreateFolder, Folder, Space};
use annograph_entity::permission::Permission;

use crate::context::RequestContext;
use crate::image::ImageService;

/// Manages folder CRUD operations.
#[derive(Clone)]
pub struct FolderService {
    /// Folder store.
    folders: Arc<dyn FolderStore>,
    /// Image store, for enumerating contents on delete.
    images: Arc<dyn ImageStore>,
    /// Organization store.
    organizations: Arc<dyn OrganizationStore>,
    /// Membership lookups.
    membership: Arc<dyn MembershipStore>,
    /// Image service, used to cascade deletes.
    image_service: Arc<ImageService>,
    /// Permission engine.
    engine: PermissionEngine,
}

impl std::fmt::Debug for FolderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolderService").finish_non_exhaustive()
    }
}

/// Request to create a new folder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateFolderRequest {
    /// Folder name.
    pub name: String,
    /// Requested space.
    pub space: Space,
    /// Owning organization (organization space only).
    pub organization_id: Option<OrganizationId>,
}

/// Request to copy a folder into one of the caller's own spaces.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CopyFolderRequest {
    /// Space of the copy; `user_private` or `user_public`.
    pub target_space: Space,
    /// Name of the copy; `<source>_copy` when absent.
    #[serde(default)]
    pub name: Option<String>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        folders: Arc<dyn FolderStore>,
        images: Arc<dyn ImageStore>,
        organizations: Arc<dyn OrganizationStore>,
        membership: Arc<dyn MembershipStore>,
        image_service: Arc<ImageService>,
        engine: PermissionEngine,
    ) -> Self {
        Self {
            folders,
            images,
            organizations,
            membership,
            image_service,
            engine,
        }
    }

    /// Creates a new folder.
    ///
    /// User spaces are owned by the caller. Organization folders need an
    /// organization the caller administers; platform folders need a
    /// platform admin.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        let user = *ctx.require_user()?;

        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Folder name cannot be empty"));
        }

        let data = match req.space {
            Space::UserPrivate | Space::UserPublic => CreateFolder::for_user(name, req.space, user.id),
            Space::OrganizationPublic => {
                let org_id = req.organization_id.ok_or_else(|| {
                    AppError::validation("An organization folder requires an organization id")
                })?;
                self.organizations
                    .find_by_id(org_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Organization not found"))?;
                self.engine
                    .check_organization_admin(org_id, ctx.user())
                    .await?;
                CreateFolder::for_organization(name, org_id)
            }
            Space::PlatformPublic => {
                PermissionEngine::require_platform_admin(ctx.user())?;
                CreateFolder::for_platform(name)
            }
        };

        let folder = Folder::from_create(data);
        self.folders.create(&folder).await?;

        info!(
            user_id = %user.id,
            folder_id = %folder.id,
            space = %folder.space,
            "Folder created"
        );

        Ok(folder)
    }

    /// Gets a folder by ID.
    pub async fn get_folder(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<Folder> {
        let folder = self.find_live(folder_id).await?;
        self.engine
            .check_folder_permission(&folder, ctx.user(), Permission::Read)
            .await?;
        Ok(folder)
    }

    /// Renames a folder.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        new_name: &str,
    ) -> AppResult<Folder> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::validation("Folder name cannot be empty"));
        }

        let folder = self.find_live(folder_id).await?;
        self.engine
            .check_folder_permission(&folder, ctx.user(), Permission::Write)
            .await?;

        let updated = self
            .folders
            .rename(folder_id, new_name)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        info!(folder_id = %folder_id, name = new_name, "Folder renamed");
        Ok(updated)
    }

    /// Deletes a folder after removing every image it contains.
    ///
    /// A folder with a pending merge cannot be deleted until the merge is
    /// decided. Deleting an already-deleted folder is `NotFound`.
    pub async fn delete_folder(&self, ctx: &RequestContext, folder_id: FolderId) -> AppResult<()> {
        let folder = self.find_live(folder_id).await?;
        self.engine
            .check_folder_permission(&folder, ctx.user(), Permission::Write)
            .await?;

        if folder.is_merge_pending() {
            return Err(AppError::invalid_state(
                "Folder has a pending merge request; reject or approve it first",
            ));
        }

        let image_ids: Vec<_> = self
            .images
            .list_all_in_folder(folder_id)
            .await?
            .into_iter()
            .map(|image| image.id)
            .collect();
        if !image_ids.is_empty() {
            self.image_service
                .delete_images_batch(ctx, &image_ids)
                .await?;
        }

        self.folders.soft_delete(folder_id).await?;

        info!(
            folder_id = %folder_id,
            images = image_ids.len(),
            "Folder deleted"
        );
        Ok(())
    }

    /// Copies a readable folder, with its images, annotations and graph
    /// nodes, into a new folder owned by the caller.
    ///
    /// If any image fails to copy, the copies made so far and the new
    /// folder are removed again.
    pub async fn copy_folder(
        &self,
        ctx: &RequestContext,
        source_id: FolderId,
        req: CopyFolderRequest,
    ) -> AppResult<Folder> {
        let user = *ctx.require_user()?;
        let source = self.find_live(source_id).await?;
        self.engine
            .check_folder_permission(&source, ctx.user(), Permission::Read)
            .await?;

        if !matches!(req.target_space, Space::UserPrivate | Space::UserPublic) {
            return Err(AppError::validation(
                "A folder can only be copied into user_private or user_public space",
            ));
        }

        let name = match req.name.as_deref().map(str::trim) {
            Some("") => return Err(AppError::validation("Folder name cannot be empty")),
            Some(name) => name.to_string(),
            None => format!("{}_copy", source.name),
        };

        let copy = Folder::from_create(CreateFolder::for_user(&name, req.target_space, user.id));
        self.folders.create(&copy).await?;

        let sources = self.images.list_all_in_folder(source.id).await?;
        let mut copied = Vec::with_capacity(sources.len());
        for image in &sources {
            match self.image_service.copy_image(&user, image, &copy).await {
                Ok(new_image) => copied.push(new_image),
                Err(e) => {
                    error!(
                        source_folder_id = %source.id,
                        folder_id = %copy.id,
                        image_id = %image.id,
                        error = %e,
                        "Folder copy failed; removing partial copy"
                    );
                    for new_image in &copied {
                        self.image_service.discard_image(new_image, true).await;
                    }
                    self.folders.soft_delete(copy.id).await?;
                    return Err(e);
                }
            }
        }

        info!(
            user_id = %user.id,
            source_folder_id = %source.id,
            folder_id = %copy.id,
            images = copied.len(),
            "Folder copied"
        );
        Ok(copy)
    }

    /// Lists the folders the caller can see: platform folders, their own
    /// folders, and folders of their organizations. Platform admins see
    /// every folder.
    pub async fn list_visible_folders(&self, ctx: &RequestContext) -> AppResult<Vec<Folder>> {
        let user = ctx.require_user()?;
        if user.is_admin() {
            return self.folders.list_all().await;
        }
        let org_ids = self.membership.organization_ids_of(user.id).await?;
        self.folders.list_visible(user.id, &org_ids).await
    }

    async fn find_live(&self, folder_id: FolderId) -> AppResult<Folder> {
        self.folders
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }
}

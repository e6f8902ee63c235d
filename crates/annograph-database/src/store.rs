//! Store traits over the relational data.
//!
//! Every read excludes soft-deleted rows. Implementations map driver
//! failures to [`ErrorKind::Database`](annograph_core::ErrorKind::Database)
//! and unique-key violations to `Conflict`.

use async_trait::async_trait;

use annograph_core::result::AppResult;
use annograph_core::types::{
    AnnotationId, FolderId, ImageId, OrganizationId, PageRequest, PageResponse, UserId,
};
use annograph_entity::annotation::Annotation;
use annograph_entity::folder::Folder;
use annograph_entity::image::Image;
use annograph_entity::organization::{OrgRole, Organization, OrganizationMember};
use annograph_entity::user::{User, UserProfile};

/// Membership lookups consulted by the permission engine.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Role of the user in the organization, if a member.
    async fn role_of(&self, user_id: UserId, org_id: OrganizationId) -> AppResult<Option<OrgRole>>;

    /// Every live organization the user belongs to.
    async fn organization_ids_of(&self, user_id: UserId) -> AppResult<Vec<OrganizationId>>;
}

/// Organization rows and their members.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Insert an organization together with its creator's admin membership.
    async fn create(&self, org: &Organization, creator: &OrganizationMember) -> AppResult<()>;

    /// Find a live organization by id.
    async fn find_by_id(&self, id: OrganizationId) -> AppResult<Option<Organization>>;

    /// Find a live organization by name.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Organization>>;

    /// Update name and description; `None` keeps the current value.
    async fn update(
        &self,
        id: OrganizationId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<Option<Organization>>;

    /// Drop every membership, reject every pending merge into the
    /// organization, and soft-delete it, all in one transaction.
    async fn soft_delete(&self, id: OrganizationId) -> AppResult<bool>;

    /// Add a member. A second membership for the same user is a conflict.
    async fn add_member(&self, member: &OrganizationMember) -> AppResult<()>;

    /// Remove a member.
    async fn remove_member(&self, org_id: OrganizationId, user_id: UserId) -> AppResult<bool>;

    /// All members of the organization, oldest first.
    async fn list_members(&self, org_id: OrganizationId) -> AppResult<Vec<OrganizationMember>>;
}

/// User rows.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user.
    async fn create(&self, user: &User) -> AppResult<()>;

    /// Find a live user by id.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Find a live user by login account.
    async fn find_by_account(&self, account: &str) -> AppResult<Option<User>>;

    /// Public profiles of the given users; unknown ids are skipped.
    async fn profiles(&self, ids: &[UserId]) -> AppResult<Vec<UserProfile>>;
}

/// Folder rows and merge-state transitions.
#[async_trait]
pub trait FolderStore: Send + Sync {
    /// Insert a folder.
    async fn create(&self, folder: &Folder) -> AppResult<()>;

    /// Find a live folder by id.
    async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>>;

    /// Every live folder, newest first.
    async fn list_all(&self) -> AppResult<Vec<Folder>>;

    /// Platform folders, the user's folders, and folders of the given
    /// organizations, newest first.
    async fn list_visible(
        &self,
        user_id: UserId,
        org_ids: &[OrganizationId],
    ) -> AppResult<Vec<Folder>>;

    /// Rename a live folder.
    async fn rename(&self, id: FolderId, name: &str) -> AppResult<Option<Folder>>;

    /// Soft-delete a live folder. Returns `false` when nothing changed.
    async fn soft_delete(&self, id: FolderId) -> AppResult<bool>;

    /// Move a `user_public` folder in state `NONE` or `REJECTED` to
    /// `PENDING`. Returns `None` when the precondition no longer holds.
    async fn request_merge(
        &self,
        id: FolderId,
        target: OrganizationId,
    ) -> AppResult<Option<Folder>>;

    /// Folders with a pending merge into the organization.
    async fn list_pending_merges(&self, org_id: OrganizationId) -> AppResult<Vec<Folder>>;

    /// Atomically reassign a pending folder to its target organization and
    /// mark it `APPROVED`. Returns `None` when it is no longer pending.
    async fn approve_merge(&self, id: FolderId) -> AppResult<Option<Folder>>;

    /// Mark a pending folder `REJECTED`. Returns `None` when it is no
    /// longer pending.
    async fn reject_merge(&self, id: FolderId) -> AppResult<Option<Folder>>;
}

/// Image rows.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Insert an image. A duplicate storage path is a conflict.
    async fn create(&self, image: &Image) -> AppResult<()>;

    /// Find a live image by id.
    async fn find_by_id(&self, id: ImageId) -> AppResult<Option<Image>>;

    /// Find a live image by storage path (the graph node name).
    async fn find_by_storage_path(&self, path: &str) -> AppResult<Option<Image>>;

    /// Find a live image in a folder by display filename.
    async fn find_by_filename(&self, folder_id: FolderId, filename: &str)
    -> AppResult<Option<Image>>;

    /// Page through a folder's images, newest first, optionally filtering
    /// the filename by a case-insensitive keyword.
    async fn list_by_folder(
        &self,
        folder_id: FolderId,
        keyword: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Image>>;

    /// Every live image in a folder.
    async fn list_all_in_folder(&self, folder_id: FolderId) -> AppResult<Vec<Image>>;

    /// Soft-deleted images of a folder. Storage paths are never reused, so
    /// a graph node named by one of them is an orphan.
    async fn list_deleted_in_folder(&self, folder_id: FolderId) -> AppResult<Vec<Image>>;

    /// Change the display filename.
    async fn rename(&self, id: ImageId, filename: &str) -> AppResult<Option<Image>>;

    /// Soft-delete the image and hard-delete its annotation in one
    /// transaction. Returns `false` when the image was already gone.
    async fn soft_delete_with_annotation(&self, id: ImageId) -> AppResult<bool>;
}

/// Annotation rows.
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Insert an annotation. A second annotation for the image is a conflict.
    async fn create(&self, annotation: &Annotation) -> AppResult<()>;

    /// Find an annotation by id.
    async fn find_by_id(&self, id: AnnotationId) -> AppResult<Option<Annotation>>;

    /// Find the annotation of an image.
    async fn find_by_image(&self, image_id: ImageId) -> AppResult<Option<Annotation>>;

    /// Replace the document.
    async fn update_content(
        &self,
        id: AnnotationId,
        content: &serde_json::Value,
        editor: UserId,
    ) -> AppResult<Option<Annotation>>;

    /// Delete an annotation.
    async fn delete(&self, id: AnnotationId) -> AppResult<bool>;
}

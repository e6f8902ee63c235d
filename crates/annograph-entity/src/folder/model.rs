//! Folder entity model.

use annograph_core::types::{FolderId, OrganizationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::merge::MergeState;
use super::space::Space;

/// A named collection of images with a space classification.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Folder name.
    pub name: String,
    /// Visibility class.
    pub space: Space,
    /// Owning user for `user_public` and `user_private` folders.
    pub owner_user_id: Option<UserId>,
    /// Owning organization for `organization_public` folders.
    pub owner_organization_id: Option<OrganizationId>,
    /// Merge workflow state.
    pub merge_state: MergeState,
    /// Organization a pending merge targets.
    pub target_organization_id: Option<OrganizationId>,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Build a fresh folder row from creation data.
    pub fn from_create(data: CreateFolder) -> Self {
        let now = Utc::now();
        Self {
            id: FolderId::new(),
            name: data.name,
            space: data.space,
            owner_user_id: data.owner_user_id,
            owner_organization_id: data.owner_organization_id,
            merge_state: MergeState::None,
            target_organization_id: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the given user owns this folder personally.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_user_id == Some(user_id)
    }

    /// Check if a merge decision is outstanding.
    pub fn is_merge_pending(&self) -> bool {
        self.merge_state.is_pending()
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// Folder name.
    pub name: String,
    /// Visibility class.
    pub space: Space,
    /// Owning user (user spaces only).
    pub owner_user_id: Option<UserId>,
    /// Owning organization (organization space only).
    pub owner_organization_id: Option<OrganizationId>,
}

impl CreateFolder {
    /// Creation data for a folder owned by a user.
    pub fn for_user(name: impl Into<String>, space: Space, owner: UserId) -> Self {
        Self {
            name: name.into(),
            space,
            owner_user_id: Some(owner),
            owner_organization_id: None,
        }
    }

    /// Creation data for an organization folder.
    pub fn for_organization(name: impl Into<String>, organization: OrganizationId) -> Self {
        Self {
            name: name.into(),
            space: Space::OrganizationPublic,
            owner_user_id: None,
            owner_organization_id: Some(organization),
        }
    }

    /// Creation data for a platform folder.
    pub fn for_platform(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            space: Space::PlatformPublic,
            owner_user_id: None,
            owner_organization_id: None,
        }
    }
}

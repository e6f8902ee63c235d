//! Folder classification.

use serde::{Deserialize, Serialize};

use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_core::types::{OrganizationId, UserId};
use annograph_entity::folder::{Folder, Space};

/// Ownership class of a folder, carrying the owner the class needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "space", content = "owner", rename_all = "snake_case")]
pub enum Classification {
    /// Platform space; no owner.
    PlatformPublic,
    /// Owned by an organization.
    OrganizationPublic(OrganizationId),
    /// Owned by a user, mergeable into an organization.
    UserPublic(UserId),
    /// Owned by a user.
    UserPrivate(UserId),
}

impl Classification {
    /// The space this class corresponds to.
    pub fn space(&self) -> Space {
        match self {
            Self::PlatformPublic => Space::PlatformPublic,
            Self::OrganizationPublic(_) => Space::OrganizationPublic,
            Self::UserPublic(_) => Space::UserPublic,
            Self::UserPrivate(_) => Space::UserPrivate,
        }
    }
}

/// Classify a folder from its space and owner columns.
///
/// A folder whose owner columns do not fit its space is a broken row and
/// yields an internal error instead of any particular class.
pub fn classify(folder: &Folder) -> AppResult<Classification> {
    let inconsistent = || {
        AppError::internal(format!(
            "Folder {} has owners inconsistent with space '{}'",
            folder.id, folder.space
        ))
    };
    match (folder.space, folder.owner_user_id, folder.owner_organization_id) {
        (Space::PlatformPublic, None, None) => Ok(Classification::PlatformPublic),
        (Space::OrganizationPublic, None, Some(org)) => Ok(Classification::OrganizationPublic(org)),
        (Space::UserPublic, Some(user), None) => Ok(Classification::UserPublic(user)),
        (Space::UserPrivate, Some(user), None) => Ok(Classification::UserPrivate(user)),
        _ => Err(inconsistent()),
    }
}

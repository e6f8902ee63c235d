//! Folder space classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visibility and ownership class of a folder.
///
/// `UserPublic` is personal space that may be merged into an organization;
/// it is not readable by other users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "folder_space", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Space {
    /// Readable by every logged-in user, writable only by platform admins.
    PlatformPublic,
    /// Owned by an organization.
    OrganizationPublic,
    /// Owned by a user, eligible for merging into an organization.
    UserPublic,
    /// Owned by a user.
    UserPrivate,
}

impl Space {
    /// Every space, in declaration order.
    pub const ALL: [Space; 4] = [
        Self::PlatformPublic,
        Self::OrganizationPublic,
        Self::UserPublic,
        Self::UserPrivate,
    ];

    /// Whether folders of this space are owned by a single user.
    pub fn is_user_owned(&self) -> bool {
        matches!(self, Self::UserPublic | Self::UserPrivate)
    }

    /// Return the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlatformPublic => "platform_public",
            Self::OrganizationPublic => "organization_public",
            Self::UserPublic => "user_public",
            Self::UserPrivate => "user_private",
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Space {
    type Err = annograph_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "platform_public" => Ok(Self::PlatformPublic),
            "organization_public" => Ok(Self::OrganizationPublic),
            "user_public" => Ok(Self::UserPublic),
            "user_private" => Ok(Self::UserPrivate),
            _ => Err(annograph_core::AppError::validation(format!(
                "Invalid space: '{s}'. Expected one of: platform_public, organization_public, user_public, user_private"
            ))),
        }
    }
}

//! User entity model.

use annograph_core::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::role::UserRole;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique login account.
    pub user_account: String,
    /// Display name.
    pub user_name: Option<String>,
    /// Avatar URL.
    pub user_avatar: Option<String>,
    /// Free-form self description.
    pub user_profile: Option<String>,
    /// Platform role.
    pub user_role: UserRole,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Check if this user has platform admin privileges.
    pub fn is_admin(&self) -> bool {
        self.user_role.is_admin()
    }

    /// The identity handed to authorization checks.
    pub fn auth(&self) -> AuthUser {
        AuthUser {
            id: self.id,
            role: self.user_role,
        }
    }

    /// The publicly visible part of the user.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            user_name: self.user_name.clone(),
            user_avatar: self.user_avatar.clone(),
            user_profile: self.user_profile.clone(),
            created_at: self.created_at,
        }
    }
}

/// An already-authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// User identifier.
    pub id: UserId,
    /// Platform role.
    pub role: UserRole,
}

impl AuthUser {
    /// Build an authenticated identity.
    pub fn new(id: UserId, role: UserRole) -> Self {
        Self { id, role }
    }

    /// Check if the caller is a platform admin.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Public profile of a user, safe to show to other users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub user_name: Option<String>,
    /// Avatar URL.
    pub user_avatar: Option<String>,
    /// Free-form self description.
    pub user_profile: Option<String>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

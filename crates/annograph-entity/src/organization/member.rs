//! Organization membership.

use annograph_core::types::{MemberId, OrganizationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::role::OrgRole;
use crate::user::UserProfile;

/// A (organization, user, role) membership tuple.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrganizationMember {
    /// Unique membership identifier.
    pub id: MemberId,
    /// The organization.
    pub organization_id: OrganizationId,
    /// The member.
    pub user_id: UserId,
    /// Role inside the organization.
    pub role: OrgRole,
    /// When the user joined.
    pub joined_at: DateTime<Utc>,
}

impl OrganizationMember {
    /// Build a fresh membership row.
    pub fn new(organization_id: OrganizationId, user_id: UserId, role: OrgRole) -> Self {
        Self {
            id: MemberId::new(),
            organization_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }
}

/// A member's public profile together with their role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberProfile {
    /// The user's public profile.
    pub user: UserProfile,
    /// Role inside the organization.
    pub role: OrgRole,
    /// When the user joined.
    pub joined_at: DateTime<Utc>,
}

//! Organization entity model.

use annograph_core::types::{OrganizationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An organization that can own folders.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    /// Unique organization identifier.
    pub id: OrganizationId,
    /// Unique organization name.
    pub name: String,
    /// The creating user; cannot be removed from the organization.
    pub owner_id: UserId,
    /// Free-form description.
    pub description: Option<String>,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// When the organization was created.
    pub created_at: DateTime<Utc>,
    /// When the organization was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Build a fresh organization row.
    pub fn new(name: impl Into<String>, description: Option<String>, owner_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: OrganizationId::new(),
            name: name.into(),
            owner_id,
            description,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

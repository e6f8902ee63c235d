//! Organization and membership repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use annograph_core::result::AppResult;
use annograph_core::types::{OrganizationId, UserId};
use annograph_entity::organization::{OrgRole, Organization, OrganizationMember};

use super::folder::FolderRepository;
use super::{db_err, map_unique};
use crate::store::{MembershipStore, OrganizationStore};

/// Repository for organizations and their members.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    /// Create a new organization repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for OrganizationRepository {
    async fn role_of(&self, user_id: UserId, org_id: OrganizationId) -> AppResult<Option<OrgRole>> {
        sqlx::query_scalar::<_, OrgRole>(
            "SELECT m.role FROM organization_members m \
             JOIN organizations o ON o.id = m.organization_id \
             WHERE m.user_id = $1 AND m.organization_id = $2 AND NOT o.is_deleted",
        )
        .bind(user_id)
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to look up membership role"))
    }

    async fn organization_ids_of(&self, user_id: UserId) -> AppResult<Vec<OrganizationId>> {
        sqlx::query_scalar::<_, OrganizationId>(
            "SELECT m.organization_id FROM organization_members m \
             JOIN organizations o ON o.id = m.organization_id \
             WHERE m.user_id = $1 AND NOT o.is_deleted",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list user organizations"))
    }
}

#[async_trait]
impl OrganizationStore for OrganizationRepository {
    async fn create(&self, org: &Organization, creator: &OrganizationMember) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        sqlx::query(
            "INSERT INTO organizations (id, name, owner_id, description, is_deleted, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(org.id)
        .bind(&org.name)
        .bind(org.owner_id)
        .bind(&org.description)
        .bind(org.is_deleted)
        .bind(org.created_at)
        .bind(org.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_unique(
                e,
                "organizations_live_name_key",
                || format!("Organization '{}' already exists", org.name),
                "Failed to create organization",
            )
        })?;

        sqlx::query(
            "INSERT INTO organization_members (id, organization_id, user_id, role, joined_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(creator.id)
        .bind(creator.organization_id)
        .bind(creator.user_id)
        .bind(creator.role)
        .bind(creator.joined_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to add organization creator"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit organization creation"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: OrganizationId) -> AppResult<Option<Organization>> {
        sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find organization"))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Organization>> {
        sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations WHERE name = $1 AND NOT is_deleted",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find organization by name"))
    }

    async fn update(
        &self,
        id: OrganizationId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<Option<Organization>> {
        sqlx::query_as::<_, Organization>(
            "UPDATE organizations SET name = COALESCE($2, name), \
             description = COALESCE($3, description), updated_at = NOW() \
             WHERE id = $1 AND NOT is_deleted RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_unique(
                e,
                "organizations_live_name_key",
                || format!("Organization '{}' already exists", name.unwrap_or_default()),
                "Failed to update organization",
            )
        })
    }

    async fn soft_delete(&self, id: OrganizationId) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        sqlx::query("DELETE FROM organization_members WHERE organization_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to remove organization members"))?;

        let rejected = FolderRepository::reject_merges_into(&mut *tx, id).await?;
        if rejected > 0 {
            debug!(org_id = %id, rejected, "Rejected pending merges of deleted organization");
        }

        let result = sqlx::query(
            "UPDATE organizations SET is_deleted = TRUE, updated_at = NOW() \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to delete organization"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit organization deletion"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_member(&self, member: &OrganizationMember) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO organization_members (id, organization_id, user_id, role, joined_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(member.id)
        .bind(member.organization_id)
        .bind(member.user_id)
        .bind(member.role)
        .bind(member.joined_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique(
                e,
                "organization_members_org_user_key",
                || format!("User {} is already a member", member.user_id),
                "Failed to add member",
            )
        })?;
        Ok(())
    }

    async fn remove_member(&self, org_id: OrganizationId, user_id: UserId) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM organization_members WHERE organization_id = $1 AND user_id = $2",
        )
        .bind(org_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to remove member"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_members(&self, org_id: OrganizationId) -> AppResult<Vec<OrganizationMember>> {
        sqlx::query_as::<_, OrganizationMember>(
            "SELECT * FROM organization_members WHERE organization_id = $1 ORDER BY joined_at ASC",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list members"))
    }
}

//! Folder repository implementation.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use annograph_core::result::AppResult;
use annograph_core::types::{FolderId, OrganizationId, UserId};
use annograph_entity::folder::{Folder, MergeState};

use super::db_err;
use crate::store::FolderStore;

/// Repository for folder rows and merge transitions.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reject every pending merge into the organization on the given
    /// connection, so callers can run it inside their own transaction.
    pub(crate) async fn reject_merges_into(
        conn: &mut PgConnection,
        org_id: OrganizationId,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE folders SET merge_state = 'REJECTED', updated_at = NOW() \
             WHERE target_organization_id = $1 AND merge_state = 'PENDING' AND NOT is_deleted",
        )
        .bind(org_id)
        .execute(conn)
        .await
        .map_err(db_err("Failed to reject pending merges"))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl FolderStore for FolderRepository {
    async fn create(&self, folder: &Folder) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO folders (id, name, space, owner_user_id, owner_organization_id, \
             merge_state, target_organization_id, is_deleted, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(folder.id)
        .bind(&folder.name)
        .bind(folder.space)
        .bind(folder.owner_user_id)
        .bind(folder.owner_organization_id)
        .bind(folder.merge_state)
        .bind(folder.target_organization_id)
        .bind(folder.is_deleted)
        .bind(folder.created_at)
        .bind(folder.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to create folder"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find folder"))
    }

    async fn list_all(&self) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE NOT is_deleted ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list folders"))
    }

    async fn list_visible(
        &self,
        user_id: UserId,
        org_ids: &[OrganizationId],
    ) -> AppResult<Vec<Folder>> {
        let org_ids: Vec<Uuid> = org_ids.iter().map(|id| id.into_uuid()).collect();
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE NOT is_deleted AND ( \
                space = 'platform_public' \
                OR (space IN ('user_public', 'user_private') AND owner_user_id = $1) \
                OR (space = 'organization_public' AND owner_organization_id = ANY($2)) \
             ) ORDER BY created_at DESC",
        )
        .bind(user_id)
        .bind(&org_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list visible folders"))
    }

    async fn rename(&self, id: FolderId, name: &str) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = $2, updated_at = NOW() \
             WHERE id = $1 AND NOT is_deleted RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to rename folder"))
    }

    async fn soft_delete(&self, id: FolderId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE folders SET is_deleted = TRUE, updated_at = NOW() \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to delete folder"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn request_merge(
        &self,
        id: FolderId,
        target: OrganizationId,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET merge_state = 'PENDING', target_organization_id = $2, \
             updated_at = NOW() \
             WHERE id = $1 AND NOT is_deleted AND space = 'user_public' \
             AND merge_state IN ('NONE', 'REJECTED') RETURNING *",
        )
        .bind(id)
        .bind(target)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to request merge"))
    }

    async fn list_pending_merges(&self, org_id: OrganizationId) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE target_organization_id = $1 \
             AND merge_state = 'PENDING' AND NOT is_deleted ORDER BY updated_at ASC",
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list pending merges"))
    }

    async fn approve_merge(&self, id: FolderId) -> AppResult<Option<Folder>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        let current = sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE id = $1 AND NOT is_deleted FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to lock folder"))?;

        let target = match current {
            Some(Folder {
                merge_state: MergeState::Pending,
                target_organization_id: Some(target),
                ..
            }) => target,
            _ => {
                debug!(folder_id = %id, "Folder is no longer pending");
                return Ok(None);
            }
        };

        let approved = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET space = 'organization_public', owner_organization_id = $2, \
             owner_user_id = NULL, merge_state = 'APPROVED', updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(target)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to approve merge"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit merge approval"))?;
        Ok(Some(approved))
    }

    async fn reject_merge(&self, id: FolderId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "UPDATE folders SET merge_state = 'REJECTED', updated_at = NOW() \
             WHERE id = $1 AND NOT is_deleted AND merge_state = 'PENDING' RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to reject merge"))
    }
}

//! Image repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use annograph_core::result::AppResult;
use annograph_core::types::{FolderId, ImageId, PageRequest, PageResponse};
use annograph_entity::image::Image;

use super::{db_err, map_unique};
use crate::store::ImageStore;

/// Repository for image rows.
#[derive(Debug, Clone)]
pub struct ImageRepository {
    pool: PgPool,
}

impl ImageRepository {
    /// Create a new image repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape `LIKE` metacharacters in a user keyword.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl ImageStore for ImageRepository {
    async fn create(&self, image: &Image) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO images (id, folder_id, original_filename, storage_path, width, height, \
             file_size, uploader_id, is_deleted, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(image.id)
        .bind(image.folder_id)
        .bind(&image.original_filename)
        .bind(&image.storage_path)
        .bind(image.width)
        .bind(image.height)
        .bind(image.file_size)
        .bind(image.uploader_id)
        .bind(image.is_deleted)
        .bind(image.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique(
                e,
                "images_storage_path_key",
                || format!("Storage path '{}' is already registered", image.storage_path),
                "Failed to create image",
            )
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: ImageId) -> AppResult<Option<Image>> {
        sqlx::query_as::<_, Image>("SELECT * FROM images WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find image"))
    }

    async fn find_by_storage_path(&self, path: &str) -> AppResult<Option<Image>> {
        sqlx::query_as::<_, Image>(
            "SELECT * FROM images WHERE storage_path = $1 AND NOT is_deleted",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find image by storage path"))
    }

    async fn find_by_filename(
        &self,
        folder_id: FolderId,
        filename: &str,
    ) -> AppResult<Option<Image>> {
        sqlx::query_as::<_, Image>(
            "SELECT * FROM images WHERE folder_id = $1 AND original_filename = $2 \
             AND NOT is_deleted ORDER BY created_at DESC LIMIT 1",
        )
        .bind(folder_id)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find image by filename"))
    }

    async fn list_by_folder(
        &self,
        folder_id: FolderId,
        keyword: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Image>> {
        let pattern = keyword
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(like_pattern);

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM images WHERE folder_id = $1 AND NOT is_deleted \
             AND ($2::TEXT IS NULL OR original_filename ILIKE $2)",
        )
        .bind(folder_id)
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count images"))?;

        let images = sqlx::query_as::<_, Image>(
            "SELECT * FROM images WHERE folder_id = $1 AND NOT is_deleted \
             AND ($2::TEXT IS NULL OR original_filename ILIKE $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(folder_id)
        .bind(pattern.as_deref())
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list images"))?;

        Ok(PageResponse::new(
            images,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    async fn list_all_in_folder(&self, folder_id: FolderId) -> AppResult<Vec<Image>> {
        sqlx::query_as::<_, Image>(
            "SELECT * FROM images WHERE folder_id = $1 AND NOT is_deleted ORDER BY created_at ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list folder images"))
    }

    async fn list_deleted_in_folder(&self, folder_id: FolderId) -> AppResult<Vec<Image>> {
        sqlx::query_as::<_, Image>(
            "SELECT * FROM images WHERE folder_id = $1 AND is_deleted ORDER BY created_at ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list deleted folder images"))
    }

    async fn rename(&self, id: ImageId, filename: &str) -> AppResult<Option<Image>> {
        sqlx::query_as::<_, Image>(
            "UPDATE images SET original_filename = $2 \
             WHERE id = $1 AND NOT is_deleted RETURNING *",
        )
        .bind(id)
        .bind(filename)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to rename image"))
    }

    async fn soft_delete_with_annotation(&self, id: ImageId) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin transaction"))?;

        let result = sqlx::query("UPDATE images SET is_deleted = TRUE WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to delete image"))?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM annotations WHERE image_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to delete image annotation"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit image deletion"))?;
        Ok(true)
    }
}

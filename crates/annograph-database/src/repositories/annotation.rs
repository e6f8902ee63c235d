//! Annotation repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use annograph_core::result::AppResult;
use annograph_core::types::{AnnotationId, ImageId, UserId};
use annograph_entity::annotation::Annotation;

use super::{db_err, map_unique};
use crate::store::AnnotationStore;

/// Repository for annotation rows.
#[derive(Debug, Clone)]
pub struct AnnotationRepository {
    pool: PgPool,
}

impl AnnotationRepository {
    /// Create a new annotation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnnotationStore for AnnotationRepository {
    async fn create(&self, annotation: &Annotation) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO annotations (id, image_id, content, last_editor_id, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(annotation.id)
        .bind(annotation.image_id)
        .bind(&annotation.content)
        .bind(annotation.last_editor_id)
        .bind(annotation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique(
                e,
                "annotations_image_id_key",
                || format!("Image {} already has an annotation", annotation.image_id),
                "Failed to create annotation",
            )
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: AnnotationId) -> AppResult<Option<Annotation>> {
        sqlx::query_as::<_, Annotation>("SELECT * FROM annotations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find annotation"))
    }

    async fn find_by_image(&self, image_id: ImageId) -> AppResult<Option<Annotation>> {
        sqlx::query_as::<_, Annotation>("SELECT * FROM annotations WHERE image_id = $1")
            .bind(image_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find annotation by image"))
    }

    async fn update_content(
        &self,
        id: AnnotationId,
        content: &serde_json::Value,
        editor: UserId,
    ) -> AppResult<Option<Annotation>> {
        sqlx::query_as::<_, Annotation>(
            "UPDATE annotations SET content = $2, last_editor_id = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(content)
        .bind(editor)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to update annotation"))
    }

    async fn delete(&self, id: AnnotationId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM annotations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to delete annotation"))?;
        Ok(result.rows_affected() > 0)
    }
}

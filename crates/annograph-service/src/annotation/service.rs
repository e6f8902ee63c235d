//! Annotation CRUD with node-level permission checks.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use annograph_auth::PermissionEngine;
use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_core::types::{AnnotationId, ImageId};
use annograph_database::store::{AnnotationStore, ImageStore};
use annograph_entity::annotation::Annotation;
use annograph_entity::permission::Permission;

use super::ensure_document;
use crate::context::RequestContext;

/// Manages annotation documents.
#[derive(Clone)]
pub struct AnnotationService {
    annotations: Arc<dyn AnnotationStore>,
    images: Arc<dyn ImageStore>,
    engine: PermissionEngine,
}

impl std::fmt::Debug for AnnotationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationService").finish_non_exhaustive()
    }
}

impl AnnotationService {
    /// Creates a new annotation service.
    pub fn new(
        annotations: Arc<dyn AnnotationStore>,
        images: Arc<dyn ImageStore>,
        engine: PermissionEngine,
    ) -> Self {
        Self {
            annotations,
            images,
            engine,
        }
    }

    /// Creates the annotation of an image. An image has at most one.
    pub async fn create_annotation(
        &self,
        ctx: &RequestContext,
        image_id: ImageId,
        content: Value,
    ) -> AppResult<Annotation> {
        let user = *ctx.require_user()?;
        let content = ensure_document(content)?;

        let image = self
            .images
            .find_by_id(image_id)
            .await?
            .ok_or_else(|| AppError::not_found("Image not found"))?;
        self.engine
            .check_node_permission(image.node_name(), ctx.user(), Permission::Write)
            .await?;

        if self.annotations.find_by_image(image_id).await?.is_some() {
            return Err(AppError::conflict("This image already has an annotation"));
        }

        let annotation = Annotation::new(image_id, content, user.id);
        self.annotations.create(&annotation).await?;

        info!(user_id = %user.id, image_id = %image_id, "Annotation created");
        Ok(annotation)
    }

    /// The annotation of an image.
    ///
    /// A missing image yields `None` rather than an error, so callers can
    /// poll while an image is being deleted.
    pub async fn get_annotation_by_image(
        &self,
        ctx: &RequestContext,
        image_id: ImageId,
    ) -> AppResult<Option<Annotation>> {
        ctx.require_user()?;
        let Some(image) = self.images.find_by_id(image_id).await? else {
            return Ok(None);
        };
        self.engine
            .check_node_permission(image.node_name(), ctx.user(), Permission::Read)
            .await?;
        self.annotations.find_by_image(image_id).await
    }

    /// Replaces an annotation's document.
    pub async fn update_annotation(
        &self,
        ctx: &RequestContext,
        annotation_id: AnnotationId,
        content: Value,
    ) -> AppResult<Annotation> {
        let user = *ctx.require_user()?;
        let content = ensure_document(content)?;

        let annotation = self
            .annotations
            .find_by_id(annotation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Annotation not found"))?;
        let image = self
            .images
            .find_by_id(annotation.image_id)
            .await?
            .ok_or_else(|| AppError::not_found("Annotated image not found"))?;
        self.engine
            .check_node_permission(image.node_name(), ctx.user(), Permission::Write)
            .await?;

        let updated = self
            .annotations
            .update_content(annotation_id, &content, user.id)
            .await?
            .ok_or_else(|| AppError::not_found("Annotation not found"))?;

        info!(user_id = %user.id, annotation_id = %annotation_id, "Annotation updated");
        Ok(updated)
    }

    /// Deletes an annotation. A missing one is a no-op; one whose image is
    /// gone is removed without a permission check.
    pub async fn delete_annotation(
        &self,
        ctx: &RequestContext,
        annotation_id: AnnotationId,
    ) -> AppResult<()> {
        ctx.require_user()?;
        let Some(annotation) = self.annotations.find_by_id(annotation_id).await? else {
            return Ok(());
        };

        match self.images.find_by_id(annotation.image_id).await? {
            Some(image) => {
                self.engine
                    .check_node_permission(image.node_name(), ctx.user(), Permission::Write)
                    .await?;
            }
            None => {
                warn!(
                    annotation_id = %annotation_id,
                    image_id = %annotation.image_id,
                    "Deleting orphan annotation"
                );
            }
        }

        self.annotations.delete(annotation_id).await?;
        info!(annotation_id = %annotation_id, "Annotation deleted");
        Ok(())
    }
}

//! Image registration, lookup, rename and deletion.
//!
//! Every image owns one graph node named by its storage path and at most
//! one annotation. Registration creates all three; deletion removes all
//! three.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use annograph_auth::PermissionEngine;
use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_core::types::{FolderId, ImageId, PageRequest, PageResponse};
use annograph_database::store::{AnnotationStore, FolderStore, ImageStore};
use annograph_entity::annotation::Annotation;
use annograph_entity::folder::Folder;
use annograph_entity::graph::{NodePermissions, is_reserved_key};
use annograph_entity::image::{Image, NewImage};
use annograph_entity::permission::Permission;
use annograph_entity::user::AuthUser;
use annograph_graph::GraphStore;

use crate::annotation::ensure_document;
use crate::context::RequestContext;
use crate::image::storage_path_for;

/// Manages images and the graph nodes derived from them.
#[derive(Clone)]
pub struct ImageService {
    images: Arc<dyn ImageStore>,
    annotations: Arc<dyn AnnotationStore>,
    folders: Arc<dyn FolderStore>,
    graph: Arc<dyn GraphStore>,
    engine: PermissionEngine,
}

impl std::fmt::Debug for ImageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageService").finish_non_exhaustive()
    }
}

/// Request to register an already-stored upload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegisterImageRequest {
    /// Metadata of the stored file.
    pub image: NewImage,
    /// Initial annotation document; an empty object when absent.
    pub annotation: Option<Value>,
}

impl ImageService {
    /// Creates a new image service.
    pub fn new(
        images: Arc<dyn ImageStore>,
        annotations: Arc<dyn AnnotationStore>,
        folders: Arc<dyn FolderStore>,
        graph: Arc<dyn GraphStore>,
        engine: PermissionEngine,
    ) -> Self {
        Self {
            images,
            annotations,
            folders,
            graph,
            engine,
        }
    }

    /// Registers an upload: the image row, its graph node carrying the
    /// folder's permission properties, and its annotation.
    ///
    /// When the node or annotation cannot be created the image row is
    /// removed again.
    pub async fn register_image(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        req: RegisterImageRequest,
    ) -> AppResult<Image> {
        let user = *ctx.require_user()?;

        if req.image.original_filename.trim().is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }
        if req.image.storage_path.trim().is_empty() {
            return Err(AppError::validation("Storage path cannot be empty"));
        }
        let content = ensure_document(
            req.annotation
                .unwrap_or_else(|| Value::Object(Default::default())),
        )?;

        let folder = self.find_folder(folder_id).await?;
        self.engine
            .check_folder_permission(&folder, ctx.user(), Permission::Write)
            .await?;

        let image = Image::from_new(folder.id, user.id, req.image);
        self.images.create(&image).await?;

        let properties = NodePermissions::from_folder(&folder).to_properties();
        if let Err(e) = self.graph.create_node(image.node_name(), &properties).await {
            error!(node = %image.storage_path, error = %e, "Graph node creation failed");
            self.discard_image(&image, false).await;
            return Err(e);
        }

        let annotation = Annotation::new(image.id, content, user.id);
        if let Err(e) = self.annotations.create(&annotation).await {
            error!(image_id = %image.id, error = %e, "Annotation creation failed");
            self.discard_image(&image, true).await;
            return Err(e);
        }

        info!(
            user_id = %user.id,
            folder_id = %folder.id,
            image_id = %image.id,
            node = %image.storage_path,
            "Image registered"
        );
        Ok(image)
    }

    /// Copies an image into `target` under a fresh storage path.
    ///
    /// The annotation document comes along when there is one. The new node
    /// keeps the source node's business properties; its permission keys
    /// come from `target`. Callers authorize both folders.
    pub(crate) async fn copy_image(
        &self,
        user: &AuthUser,
        source: &Image,
        target: &Folder,
    ) -> AppResult<Image> {
        let storage_path = storage_path_for(target, &source.original_filename)?;
        let image = Image::from_new(
            target.id,
            user.id,
            NewImage {
                original_filename: source.original_filename.clone(),
                storage_path,
                width: source.width,
                height: source.height,
                file_size: source.file_size,
            },
        );

        let mut properties = self
            .graph
            .find_node(source.node_name())
            .await?
            .map(|node| node.properties)
            .unwrap_or_default();
        properties.retain(|key, _| !is_reserved_key(key));
        properties.extend(NodePermissions::from_folder(target).to_properties());

        let annotation = self.annotations.find_by_image(source.id).await?;

        self.images.create(&image).await?;

        if let Err(e) = self.graph.create_node(image.node_name(), &properties).await {
            error!(node = %image.storage_path, error = %e, "Graph node creation failed during copy");
            self.discard_image(&image, false).await;
            return Err(e);
        }

        if let Some(annotation) = annotation {
            let copy = Annotation::new(image.id, annotation.content, user.id);
            if let Err(e) = self.annotations.create(&copy).await {
                error!(image_id = %image.id, error = %e, "Annotation copy failed");
                self.discard_image(&image, true).await;
                return Err(e);
            }
        }

        debug!(
            source = %source.storage_path,
            node = %image.storage_path,
            "Image copied"
        );
        Ok(image)
    }

    /// Gets an image by ID.
    pub async fn get_image(&self, ctx: &RequestContext, image_id: ImageId) -> AppResult<Image> {
        let image = self.find_image(image_id).await?;
        let folder = self.find_folder(image.folder_id).await?;
        self.engine
            .check_folder_permission(&folder, ctx.user(), Permission::Read)
            .await?;
        Ok(image)
    }

    /// Gets an image in a folder by its display filename.
    pub async fn get_image_by_name(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        filename: &str,
    ) -> AppResult<Image> {
        let folder = self.find_folder(folder_id).await?;
        self.engine
            .check_folder_permission(&folder, ctx.user(), Permission::Read)
            .await?;
        self.images
            .find_by_filename(folder_id, filename)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Image '{filename}' not found")))
    }

    /// Lists a folder's images, newest first.
    pub async fn list_images(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        keyword: Option<&str>,
        page: PageRequest,
    ) -> AppResult<PageResponse<Image>> {
        let folder = self.find_folder(folder_id).await?;
        self.engine
            .check_folder_permission(&folder, ctx.user(), Permission::Read)
            .await?;
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());
        self.images.list_by_folder(folder_id, keyword, &page).await
    }

    /// Changes an image's display filename. The storage path stays.
    pub async fn rename_image(
        &self,
        ctx: &RequestContext,
        image_id: ImageId,
        new_filename: &str,
    ) -> AppResult<Image> {
        let new_filename = new_filename.trim();
        if new_filename.is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }

        let image = self.find_image(image_id).await?;
        self.engine
            .check_node_permission(image.node_name(), ctx.user(), Permission::Write)
            .await?;

        let renamed = self
            .images
            .rename(image_id, new_filename)
            .await?
            .ok_or_else(|| AppError::not_found("Image not found"))?;

        info!(image_id = %image_id, filename = new_filename, "Image renamed");
        Ok(renamed)
    }

    /// Deletes an image with its annotation and graph node.
    ///
    /// The node goes first so that a graph failure leaves the image live
    /// and the delete can be retried. Deleting a missing image is a no-op.
    pub async fn delete_image(&self, ctx: &RequestContext, image_id: ImageId) -> AppResult<()> {
        ctx.require_user()?;
        let Some(image) = self.images.find_by_id(image_id).await? else {
            return Ok(());
        };

        self.engine
            .check_node_permission(image.node_name(), ctx.user(), Permission::Write)
            .await?;

        match self.graph.delete_node(image.node_name()).await {
            Ok(true) => {}
            Ok(false) => warn!(node = %image.storage_path, "Graph node already absent"),
            Err(e) => {
                error!(
                    image_id = %image_id,
                    node = %image.storage_path,
                    error = %e,
                    "Graph node removal failed; image kept"
                );
                return Err(e);
            }
        }

        if !self.images.soft_delete_with_annotation(image_id).await? {
            return Ok(());
        }

        info!(image_id = %image_id, node = %image.storage_path, "Image deleted");
        Ok(())
    }

    /// Deletes several images, stopping at the first failure.
    pub async fn delete_images_batch(
        &self,
        ctx: &RequestContext,
        image_ids: &[ImageId],
    ) -> AppResult<()> {
        if image_ids.is_empty() {
            return Err(AppError::validation("No image ids were given"));
        }
        for &image_id in image_ids {
            self.delete_image(ctx, image_id).await?;
        }
        Ok(())
    }

    async fn find_image(&self, image_id: ImageId) -> AppResult<Image> {
        self.images
            .find_by_id(image_id)
            .await?
            .ok_or_else(|| AppError::not_found("Image not found"))
    }

    async fn find_folder(&self, folder_id: FolderId) -> AppResult<Folder> {
        self.folders
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Undo a partial registration or copy.
    pub(crate) async fn discard_image(&self, image: &Image, node_created: bool) {
        if node_created {
            if let Err(e) = self.graph.delete_node(image.node_name()).await {
                warn!(
                    node = %image.storage_path,
                    error = %e,
                    "Could not remove node of discarded image"
                );
            }
        }
        if let Err(e) = self.images.soft_delete_with_annotation(image.id).await {
            warn!(image_id = %image.id, error = %e, "Could not remove discarded image row");
        }
    }
}

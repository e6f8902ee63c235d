//! Resolution of a graph node to its owning folder.

use std::sync::Arc;

use tracing::debug;

use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_database::store::{FolderStore, ImageStore};
use annograph_entity::folder::Folder;
use annograph_entity::image::Image;

/// The relational rows behind a graph node.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    /// The image whose storage path names the node.
    pub image: Image,
    /// The folder holding the image.
    pub folder: Folder,
}

/// Maps node names to their Image and Folder rows.
#[derive(Clone)]
pub struct GraphResourceResolver {
    images: Arc<dyn ImageStore>,
    folders: Arc<dyn FolderStore>,
}

impl std::fmt::Debug for GraphResourceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphResourceResolver").finish()
    }
}

impl GraphResourceResolver {
    /// Create a resolver over the image and folder stores.
    pub fn new(images: Arc<dyn ImageStore>, folders: Arc<dyn FolderStore>) -> Self {
        Self { images, folders }
    }

    /// Resolve a node name to its image and folder. Both lookups fail
    /// closed with `NotFound`.
    pub async fn resolve(&self, node_name: &str) -> AppResult<ResolvedNode> {
        let image = self
            .images
            .find_by_storage_path(node_name)
            .await?
            .ok_or_else(|| {
                debug!(node = node_name, "No live image for node");
                AppError::not_found(format!("Resource '{node_name}' does not exist or was deleted"))
            })?;

        let folder = self
            .folders
            .find_by_id(image.folder_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Folder of resource '{node_name}' does not exist"))
            })?;

        Ok(ResolvedNode { image, folder })
    }

    /// Resolve a node name to the folder that owns it.
    pub async fn resolve_owning_folder(&self, node_name: &str) -> AppResult<Folder> {
        Ok(self.resolve(node_name).await?.folder)
    }
}

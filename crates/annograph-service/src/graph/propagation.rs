//! Graph permission propagation and resync.
//!
//! Nodes mirror `space`, `ownerUserId` and `ownerOrganizationId` from the
//! folder owning their image. The relational store is the source of
//! truth; these writes only ever set or remove keys, so re-running them
//! converges on the same node state.
//!
//! Nothing here checks permissions. Callers authorize at the folder level
//! first, or run as an operator through the CLI.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info, warn};

use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_core::types::FolderId;
use annograph_database::store::{FolderStore, ImageStore};
use annograph_entity::folder::Folder;
use annograph_entity::graph::{GraphNode, NodePermissions, PropertyMap};
use annograph_graph::GraphStore;

/// Outcome of pushing permission properties onto a folder's nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationSummary {
    /// Nodes written.
    pub updated: usize,
    /// Nodes that were absent from the graph.
    pub missing: Vec<String>,
    /// Orphan nodes removed because their image is gone.
    pub removed: usize,
    /// Nodes whose write failed.
    pub failed: Vec<String>,
}

impl PropagationSummary {
    /// Whether every node write succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Turn failed writes into a graph error naming them.
    pub fn into_result(self) -> AppResult<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(AppError::graph(format!(
                "Failed to update permissions on {} graph node(s): {}; run a folder resync",
                self.failed.len(),
                self.failed.join(", ")
            )))
        }
    }
}

/// Pushes folder-derived permission properties onto graph nodes.
#[derive(Clone)]
pub struct PermissionPropagator {
    graph: Arc<dyn GraphStore>,
    images: Arc<dyn ImageStore>,
    folders: Arc<dyn FolderStore>,
}

impl std::fmt::Debug for PermissionPropagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionPropagator").finish()
    }
}

impl PermissionPropagator {
    /// Creates a new propagator.
    pub fn new(
        graph: Arc<dyn GraphStore>,
        images: Arc<dyn ImageStore>,
        folders: Arc<dyn FolderStore>,
    ) -> Self {
        Self {
            graph,
            images,
            folders,
        }
    }

    /// Merge `set` onto an existing node and drop the `remove` keys.
    ///
    /// Returns `false` when the node does not exist.
    pub async fn propagate(
        &self,
        node_name: &str,
        set: &PropertyMap,
        remove: &[String],
    ) -> AppResult<bool> {
        let updated = self
            .graph
            .merge_node_properties(node_name, set, remove)
            .await?;
        if updated.is_none() {
            warn!(node = node_name, "Graph node missing during propagation");
        }
        Ok(updated.is_some())
    }

    /// Push the folder's current permissions onto every node of its images.
    ///
    /// Node writes run concurrently and independently. Failures are logged
    /// and collected; nodes already written stay written.
    pub async fn propagate_folder(&self, folder: &Folder) -> AppResult<PropagationSummary> {
        let permissions = NodePermissions::from_folder(folder);
        let set = permissions.to_properties();
        let remove = permissions.keys_to_remove();

        let images = self.images.list_all_in_folder(folder.id).await?;
        let mut summary = PropagationSummary::default();

        let writes = images
            .iter()
            .map(|image| self.propagate(image.node_name(), &set, &remove));
        let outcomes = join_all(writes).await;

        for (image, outcome) in images.iter().zip(outcomes) {
            match outcome {
                Ok(true) => summary.updated += 1,
                Ok(false) => summary.missing.push(image.storage_path.clone()),
                Err(e) => {
                    error!(
                        folder_id = %folder.id,
                        node = %image.storage_path,
                        error = %e,
                        "Failed to propagate permissions to graph node"
                    );
                    summary.failed.push(image.storage_path.clone());
                }
            }
        }

        info!(
            folder_id = %folder.id,
            space = %folder.space,
            updated = summary.updated,
            missing = summary.missing.len(),
            failed = summary.failed.len(),
            "Permission propagation finished"
        );
        Ok(summary)
    }

    /// Re-derive a node's permission properties from its owning folder,
    /// recreating the node when it is absent.
    ///
    /// A node with no live image behind it is detach-deleted and `None` is
    /// returned. When neither image nor node exists the result is
    /// `NotFound`.
    pub async fn resync_node(&self, node_name: &str) -> AppResult<Option<GraphNode>> {
        let folder = match self.images.find_by_storage_path(node_name).await? {
            Some(image) => self.folders.find_by_id(image.folder_id).await?,
            None => None,
        };

        let Some(folder) = folder else {
            if self.graph.delete_node(node_name).await? {
                warn!(node = node_name, "Removed graph node with no live image");
                return Ok(None);
            }
            return Err(AppError::not_found(format!(
                "No live image or graph node named '{node_name}'"
            )));
        };

        let permissions = NodePermissions::from_folder(&folder);
        let node = self
            .graph
            .upsert_node(
                node_name,
                &permissions.to_properties(),
                &permissions.keys_to_remove(),
            )
            .await?;
        info!(node = node_name, folder_id = %folder.id, "Node permissions resynced");
        Ok(Some(node))
    }

    /// Resync every node of a folder's images and remove the nodes left
    /// behind by its deleted images.
    pub async fn resync_folder(&self, folder_id: FolderId) -> AppResult<PropagationSummary> {
        let folder = self
            .folders
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        let permissions = NodePermissions::from_folder(&folder);
        let set = permissions.to_properties();
        let remove = permissions.keys_to_remove();

        let mut summary = PropagationSummary::default();
        for image in self.images.list_all_in_folder(folder.id).await? {
            match self.graph.upsert_node(image.node_name(), &set, &remove).await {
                Ok(_) => summary.updated += 1,
                Err(e) => {
                    error!(node = %image.storage_path, error = %e, "Resync failed for node");
                    summary.failed.push(image.storage_path);
                }
            }
        }

        for image in self.images.list_deleted_in_folder(folder.id).await? {
            match self.graph.delete_node(image.node_name()).await {
                Ok(true) => {
                    warn!(node = %image.storage_path, "Removed orphan graph node");
                    summary.removed += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(node = %image.storage_path, error = %e, "Orphan node removal failed");
                    summary.failed.push(image.storage_path);
                }
            }
        }

        info!(
            folder_id = %folder.id,
            updated = summary.updated,
            removed = summary.removed,
            failed = summary.failed.len(),
            "Folder resync finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annograph_core::ErrorKind;

    #[test]
    fn test_summary_with_failures_is_graph_error() {
        let summary = PropagationSummary {
            updated: 2,
            missing: vec![],
            removed: 0,
            failed: vec!["user/a.png".to_string()],
        };
        assert!(!summary.is_complete());
        let err = summary.into_result().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Graph);
        assert!(err.message.contains("user/a.png"));
    }

    #[test]
    fn test_missing_nodes_do_not_fail() {
        let summary = PropagationSummary {
            updated: 1,
            missing: vec!["public/x.png".to_string()],
            removed: 1,
            failed: vec![],
        };
        assert_eq!(summary.clone().into_result().unwrap(), summary);
    }
}

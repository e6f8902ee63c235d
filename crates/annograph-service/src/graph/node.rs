//! Graph node operations.
//!
//! A node exists only for a live image and is authorized through the
//! image's folder. Callers never write the mirrored permission keys.

use std::sync::Arc;

use tracing::info;

use annograph_auth::PermissionEngine;
use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_entity::graph::{GraphNode, NodePermissions, PropertyMap};
use annograph_entity::permission::Permission;
use annograph_graph::GraphStore;

use super::reject_reserved_keys;
use crate::context::RequestContext;

/// Request to create a node for an image.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CreateNodeRequest {
    /// Node name; the image's storage path.
    pub name: String,
    /// Business properties.
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Property changes for a node.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct UpdateNodeRequest {
    /// Keys to set or overwrite.
    #[serde(default)]
    pub set: PropertyMap,
    /// Keys to drop.
    #[serde(default)]
    pub remove: Vec<String>,
}

impl UpdateNodeRequest {
    /// Whether the request changes nothing.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }
}

/// Manages graph nodes.
#[derive(Clone)]
pub struct NodeService {
    graph: Arc<dyn GraphStore>,
    engine: PermissionEngine,
}

impl std::fmt::Debug for NodeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeService").finish_non_exhaustive()
    }
}

impl NodeService {
    /// Creates a new node service.
    pub fn new(graph: Arc<dyn GraphStore>, engine: PermissionEngine) -> Self {
        Self { graph, engine }
    }

    /// Creates the node of an existing image.
    pub async fn create_node(
        &self,
        ctx: &RequestContext,
        req: CreateNodeRequest,
    ) -> AppResult<GraphNode> {
        ctx.require_user()?;
        reject_reserved_keys(req.properties.keys().map(String::as_str))?;

        let resolved = self
            .engine
            .authorize_node(&req.name, ctx.user(), Permission::Write)
            .await?;

        let mut properties = req.properties;
        properties.extend(NodePermissions::from_folder(&resolved.folder).to_properties());

        let node = self.graph.create_node(&req.name, &properties).await?;
        info!(node = %node.name, folder_id = %resolved.folder.id, "Graph node created");
        Ok(node)
    }

    /// Finds a node. `None` when the image exists but its node does not.
    pub async fn find_node(&self, ctx: &RequestContext, name: &str) -> AppResult<Option<GraphNode>> {
        self.engine
            .check_node_permission(name, ctx.user(), Permission::Read)
            .await?;
        self.graph.find_node(name).await
    }

    /// Sets and removes business properties on a node.
    pub async fn update_node(
        &self,
        ctx: &RequestContext,
        name: &str,
        req: UpdateNodeRequest,
    ) -> AppResult<GraphNode> {
        ctx.require_user()?;
        reject_reserved_keys(
            req.set
                .keys()
                .map(String::as_str)
                .chain(req.remove.iter().map(String::as_str)),
        )?;

        self.engine
            .check_node_permission(name, ctx.user(), Permission::Write)
            .await?;

        let node = if req.is_empty() {
            self.graph.find_node(name).await?
        } else {
            self.graph
                .merge_node_properties(name, &req.set, &req.remove)
                .await?
        };
        node.ok_or_else(|| AppError::not_found(format!("Graph node '{name}' not found")))
    }

    /// Deletes a node and every relationship touching it.
    pub async fn delete_node(&self, ctx: &RequestContext, name: &str) -> AppResult<bool> {
        self.engine
            .check_node_permission(name, ctx.user(), Permission::Write)
            .await?;
        let deleted = self.graph.delete_node(name).await?;
        if deleted {
            info!(node = name, "Graph node deleted");
        }
        Ok(deleted)
    }

    /// Nodes the caller may see, judged by their mirrored properties.
    pub async fn list_visible_nodes(&self, ctx: &RequestContext) -> AppResult<Vec<GraphNode>> {
        let visibility = self.engine.node_visibility(ctx.user()).await?;
        self.graph.list_nodes(&visibility).await
    }
}

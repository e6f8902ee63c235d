//! Graph relationship operations.
//!
//! A relationship is addressed by its (from, type, to) triple and needs
//! the capability on both endpoints.

use std::sync::Arc;

use tracing::info;

use annograph_auth::PermissionEngine;
use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_entity::graph::{GraphRelationship, PropertyMap, RelationshipKey};
use annograph_entity::permission::Permission;
use annograph_graph::{GraphStore, validate_relationship_type};

use crate::context::RequestContext;

/// Request to connect two nodes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateRelationshipRequest {
    /// Source node name.
    pub from_node: String,
    /// Target node name.
    pub to_node: String,
    /// Relationship type.
    pub rel_type: String,
    /// Relationship properties.
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Property changes for relationships.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct UpdateRelationshipRequest {
    /// Keys to set or overwrite.
    #[serde(default)]
    pub set: PropertyMap,
    /// Keys to drop.
    #[serde(default)]
    pub remove: Vec<String>,
}

/// Manages graph relationships.
#[derive(Clone)]
pub struct RelationshipService {
    graph: Arc<dyn GraphStore>,
    engine: PermissionEngine,
}

impl std::fmt::Debug for RelationshipService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationshipService").finish_non_exhaustive()
    }
}

impl RelationshipService {
    /// Creates a new relationship service.
    pub fn new(graph: Arc<dyn GraphStore>, engine: PermissionEngine) -> Self {
        Self { graph, engine }
    }

    /// Connects two nodes.
    pub async fn create_relationship(
        &self,
        ctx: &RequestContext,
        req: CreateRelationshipRequest,
    ) -> AppResult<GraphRelationship> {
        validate_relationship_type(&req.rel_type)?;
        self.check_endpoints(ctx, &req.from_node, &req.to_node, Permission::Write)
            .await?;

        let relationship = GraphRelationship {
            from_node: req.from_node,
            to_node: req.to_node,
            rel_type: req.rel_type,
            properties: req.properties,
        };
        if !self.graph.create_relationship(&relationship).await? {
            return Err(AppError::not_found(
                "Both endpoint nodes must exist before they can be connected",
            ));
        }

        info!(
            from = %relationship.from_node,
            rel_type = %relationship.rel_type,
            to = %relationship.to_node,
            "Relationship created"
        );
        Ok(relationship)
    }

    /// Finds a relationship by its triple.
    pub async fn find_relationship(
        &self,
        ctx: &RequestContext,
        key: &RelationshipKey,
    ) -> AppResult<Option<GraphRelationship>> {
        validate_relationship_type(&key.rel_type)?;
        self.check_endpoints(ctx, &key.from_node, &key.to_node, Permission::Read)
            .await?;
        self.graph.find_relationship(key).await
    }

    /// Updates every relationship matching the triple.
    pub async fn update_relationship(
        &self,
        ctx: &RequestContext,
        key: &RelationshipKey,
        req: UpdateRelationshipRequest,
    ) -> AppResult<u64> {
        validate_relationship_type(&key.rel_type)?;
        self.check_endpoints(ctx, &key.from_node, &key.to_node, Permission::Write)
            .await?;

        let updated = self
            .graph
            .update_relationships(key, &req.set, &req.remove)
            .await?;
        if updated == 0 {
            return Err(AppError::not_found("Relationship not found"));
        }
        Ok(updated)
    }

    /// Deletes every relationship matching the triple.
    pub async fn delete_relationship(
        &self,
        ctx: &RequestContext,
        key: &RelationshipKey,
    ) -> AppResult<u64> {
        validate_relationship_type(&key.rel_type)?;
        self.check_endpoints(ctx, &key.from_node, &key.to_node, Permission::Write)
            .await?;

        let deleted = self.graph.delete_relationships(key).await?;
        info!(
            from = %key.from_node,
            rel_type = %key.rel_type,
            to = %key.to_node,
            deleted,
            "Relationships deleted"
        );
        Ok(deleted)
    }

    /// Relationships whose endpoints are both visible to the caller.
    pub async fn list_visible_relationships(
        &self,
        ctx: &RequestContext,
    ) -> AppResult<Vec<GraphRelationship>> {
        let visibility = self.engine.node_visibility(ctx.user()).await?;
        let names: Vec<String> = self
            .graph
            .list_nodes(&visibility)
            .await?
            .into_iter()
            .map(|n| n.name)
            .collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }
        self.graph.list_relationships_among(&names).await
    }

    async fn check_endpoints(
        &self,
        ctx: &RequestContext,
        from_node: &str,
        to_node: &str,
        required: Permission,
    ) -> AppResult<()> {
        self.engine
            .check_node_permission(from_node, ctx.user(), required)
            .await?;
        if to_node != from_node {
            self.engine
                .check_node_permission(to_node, ctx.user(), required)
                .await?;
        }
        Ok(())
    }
}

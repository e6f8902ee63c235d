//! Graph store over PostgreSQL JSONB tables.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::FromRow;
use tracing::{debug, info};

use annograph_core::config::GraphConfig;
use annograph_core::error::{AppError, ErrorKind};
use annograph_core::result::AppResult;
use annograph_entity::graph::{
    GraphNode, GraphRelationship, NodeVisibility, PropertyMap, RelationshipKey,
};

use crate::store::GraphStore;
use crate::validation::validate_relationship_type;

#[derive(Debug, FromRow)]
struct GraphNodeRow {
    name: String,
    properties: Json<PropertyMap>,
}

impl From<GraphNodeRow> for GraphNode {
    fn from(row: GraphNodeRow) -> Self {
        Self {
            name: row.name,
            properties: row.properties.0,
        }
    }
}

#[derive(Debug, FromRow)]
struct GraphRelationshipRow {
    from_node: String,
    to_node: String,
    rel_type: String,
    properties: Json<PropertyMap>,
}

impl From<GraphRelationshipRow> for GraphRelationship {
    fn from(row: GraphRelationshipRow) -> Self {
        Self {
            from_node: row.from_node,
            to_node: row.to_node,
            rel_type: row.rel_type,
            properties: row.properties.0,
        }
    }
}

fn graph_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Graph, context, e)
}

/// Graph store on its own PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgGraphStore {
    pool: PgPool,
}

impl PgGraphStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool from the graph configuration.
    pub async fn connect(config: &GraphConfig) -> AppResult<Self> {
        info!(max_connections = config.max_connections, "Connecting to graph store");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Graph,
                    format!("Failed to connect to graph store: {e}"),
                    e,
                )
            })?;
        Ok(Self { pool })
    }

    /// Run the graph schema migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        info!("Running graph migrations");
        let mut migrator = sqlx::migrate!("./migrations");
        migrator.set_ignore_missing(true);
        migrator.run(&self.pool).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Graph,
                format!("Failed to run graph migrations: {e}"),
                e,
            )
        })?;
        info!("Graph migrations completed");
        Ok(())
    }
}

#[async_trait]
impl GraphStore for PgGraphStore {
    async fn create_node(&self, name: &str, properties: &PropertyMap) -> AppResult<GraphNode> {
        let row = sqlx::query_as::<_, GraphNodeRow>(
            "INSERT INTO graph_nodes (name, properties) VALUES ($1, $2) \
             ON CONFLICT (name) DO NOTHING RETURNING name, properties",
        )
        .bind(name)
        .bind(Json(properties))
        .fetch_optional(&self.pool)
        .await
        .map_err(graph_err("Failed to create node"))?;

        row.map(GraphNode::from)
            .ok_or_else(|| AppError::conflict(format!("Node '{name}' already exists")))
    }

    async fn find_node(&self, name: &str) -> AppResult<Option<GraphNode>> {
        let row = sqlx::query_as::<_, GraphNodeRow>(
            "SELECT name, properties FROM graph_nodes WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(graph_err("Failed to find node"))?;
        Ok(row.map(GraphNode::from))
    }

    async fn merge_node_properties(
        &self,
        name: &str,
        set: &PropertyMap,
        remove: &[String],
    ) -> AppResult<Option<GraphNode>> {
        let row = sqlx::query_as::<_, GraphNodeRow>(
            "UPDATE graph_nodes SET properties = (properties || $2) - $3::TEXT[] \
             WHERE name = $1 RETURNING name, properties",
        )
        .bind(name)
        .bind(Json(set))
        .bind(remove)
        .fetch_optional(&self.pool)
        .await
        .map_err(graph_err("Failed to update node"))?;
        Ok(row.map(GraphNode::from))
    }

    async fn upsert_node(
        &self,
        name: &str,
        set: &PropertyMap,
        remove: &[String],
    ) -> AppResult<GraphNode> {
        let row = sqlx::query_as::<_, GraphNodeRow>(
            "INSERT INTO graph_nodes (name, properties) VALUES ($1, $2::JSONB - $3::TEXT[]) \
             ON CONFLICT (name) DO UPDATE \
             SET properties = (graph_nodes.properties || $2) - $3::TEXT[] \
             RETURNING name, properties",
        )
        .bind(name)
        .bind(Json(set))
        .bind(remove)
        .fetch_one(&self.pool)
        .await
        .map_err(graph_err("Failed to upsert node"))?;
        Ok(row.into())
    }

    async fn delete_node(&self, name: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM graph_nodes WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(graph_err("Failed to delete node"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_nodes(&self, visibility: &NodeVisibility) -> AppResult<Vec<GraphNode>> {
        let rows = match visibility {
            NodeVisibility::All => {
                sqlx::query_as::<_, GraphNodeRow>(
                    "SELECT name, properties FROM graph_nodes ORDER BY name",
                )
                .fetch_all(&self.pool)
                .await
            }
            NodeVisibility::Scoped {
                user_id,
                organization_ids,
            } => {
                let org_ids: Vec<String> =
                    organization_ids.iter().map(ToString::to_string).collect();
                sqlx::query_as::<_, GraphNodeRow>(
                    "SELECT name, properties FROM graph_nodes WHERE \
                        properties ->> 'space' = 'platform_public' \
                        OR (properties ->> 'space' IN ('user_public', 'user_private') \
                            AND properties ->> 'ownerUserId' = $1) \
                        OR (properties ->> 'space' = 'organization_public' \
                            AND properties ->> 'ownerOrganizationId' = ANY($2)) \
                     ORDER BY name",
                )
                .bind(user_id.to_string())
                .bind(&org_ids)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(graph_err("Failed to list nodes"))?;
        Ok(rows.into_iter().map(GraphNode::from).collect())
    }

    async fn create_relationship(&self, relationship: &GraphRelationship) -> AppResult<bool> {
        validate_relationship_type(&relationship.rel_type)?;
        let result = sqlx::query(
            "INSERT INTO graph_relationships (from_node, to_node, rel_type, properties) \
             SELECT $1, $2, $3, $4 \
             WHERE EXISTS (SELECT 1 FROM graph_nodes WHERE name = $1) \
             AND EXISTS (SELECT 1 FROM graph_nodes WHERE name = $2)",
        )
        .bind(&relationship.from_node)
        .bind(&relationship.to_node)
        .bind(&relationship.rel_type)
        .bind(Json(&relationship.properties))
        .execute(&self.pool)
        .await
        .map_err(graph_err("Failed to create relationship"))?;
        debug!(rows = result.rows_affected(), "Relationship insert finished");
        Ok(result.rows_affected() > 0)
    }

    async fn find_relationship(
        &self,
        key: &RelationshipKey,
    ) -> AppResult<Option<GraphRelationship>> {
        validate_relationship_type(&key.rel_type)?;
        let row = sqlx::query_as::<_, GraphRelationshipRow>(
            "SELECT from_node, to_node, rel_type, properties FROM graph_relationships \
             WHERE from_node = $1 AND rel_type = $2 AND to_node = $3 ORDER BY id LIMIT 1",
        )
        .bind(&key.from_node)
        .bind(&key.rel_type)
        .bind(&key.to_node)
        .fetch_optional(&self.pool)
        .await
        .map_err(graph_err("Failed to find relationship"))?;
        Ok(row.map(GraphRelationship::from))
    }

    async fn update_relationships(
        &self,
        key: &RelationshipKey,
        set: &PropertyMap,
        remove: &[String],
    ) -> AppResult<u64> {
        validate_relationship_type(&key.rel_type)?;
        let result = sqlx::query(
            "UPDATE graph_relationships SET properties = (properties || $4) - $5::TEXT[] \
             WHERE from_node = $1 AND rel_type = $2 AND to_node = $3",
        )
        .bind(&key.from_node)
        .bind(&key.rel_type)
        .bind(&key.to_node)
        .bind(Json(set))
        .bind(remove)
        .execute(&self.pool)
        .await
        .map_err(graph_err("Failed to update relationship"))?;
        Ok(result.rows_affected())
    }

    async fn delete_relationships(&self, key: &RelationshipKey) -> AppResult<u64> {
        validate_relationship_type(&key.rel_type)?;
        let result = sqlx::query(
            "DELETE FROM graph_relationships \
             WHERE from_node = $1 AND rel_type = $2 AND to_node = $3",
        )
        .bind(&key.from_node)
        .bind(&key.rel_type)
        .bind(&key.to_node)
        .execute(&self.pool)
        .await
        .map_err(graph_err("Failed to delete relationship"))?;
        Ok(result.rows_affected())
    }

    async fn list_relationships_among(
        &self,
        names: &[String],
    ) -> AppResult<Vec<GraphRelationship>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, GraphRelationshipRow>(
            "SELECT from_node, to_node, rel_type, properties FROM graph_relationships \
             WHERE from_node = ANY($1) AND to_node = ANY($1) ORDER BY id",
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await
        .map_err(graph_err("Failed to list relationships"))?;
        Ok(rows.into_iter().map(GraphRelationship::from).collect())
    }
}

//! The graph store contract.

use async_trait::async_trait;

use annograph_core::result::AppResult;
use annograph_entity::graph::{
    GraphNode, GraphRelationship, NodeVisibility, PropertyMap, RelationshipKey,
};

/// Node and relationship persistence keyed by node name and
/// (from, type, to) triples.
///
/// Property writes have merge semantics: `set` keys overwrite, then
/// `remove` keys are dropped. Repeating a write is harmless.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create a node. An existing node of that name is a conflict.
    async fn create_node(&self, name: &str, properties: &PropertyMap) -> AppResult<GraphNode>;

    /// Find a node by name.
    async fn find_node(&self, name: &str) -> AppResult<Option<GraphNode>>;

    /// Merge properties into an existing node. `None` when it is absent.
    async fn merge_node_properties(
        &self,
        name: &str,
        set: &PropertyMap,
        remove: &[String],
    ) -> AppResult<Option<GraphNode>>;

    /// Merge properties into a node, creating it when absent.
    async fn upsert_node(
        &self,
        name: &str,
        set: &PropertyMap,
        remove: &[String],
    ) -> AppResult<GraphNode>;

    /// Delete a node and every relationship touching it.
    async fn delete_node(&self, name: &str) -> AppResult<bool>;

    /// Nodes inside the visibility scope, ordered by name.
    async fn list_nodes(&self, visibility: &NodeVisibility) -> AppResult<Vec<GraphNode>>;

    /// Create a relationship. Returns `false` when an endpoint is missing.
    async fn create_relationship(&self, relationship: &GraphRelationship) -> AppResult<bool>;

    /// The first relationship with the key, if any.
    async fn find_relationship(&self, key: &RelationshipKey)
    -> AppResult<Option<GraphRelationship>>;

    /// Merge properties into every relationship with the key. Returns how
    /// many were updated.
    async fn update_relationships(
        &self,
        key: &RelationshipKey,
        set: &PropertyMap,
        remove: &[String],
    ) -> AppResult<u64>;

    /// Delete every relationship with the key. Returns how many were removed.
    async fn delete_relationships(&self, key: &RelationshipKey) -> AppResult<u64>;

    /// Relationships whose endpoints are both among `names`.
    async fn list_relationships_among(&self, names: &[String])
    -> AppResult<Vec<GraphRelationship>>;
}

/// Apply `set` then `remove` to a property map.
pub fn apply_property_changes(target: &mut PropertyMap, set: &PropertyMap, remove: &[String]) {
    for (key, value) in set {
        target.insert(key.clone(), value.clone());
    }
    for key in remove {
        target.remove(key);
    }
}

//! In-memory graph store.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_entity::graph::{
    GraphNode, GraphRelationship, NodeVisibility, PropertyMap, RelationshipKey,
};

use crate::store::{GraphStore, apply_property_changes};
use crate::validation::validate_relationship_type;

/// Graph held in process memory.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    nodes: DashMap<String, GraphNode>,
    relationships: RwLock<Vec<GraphRelationship>>,
}

impl MemoryGraphStore {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently stored.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn matches_key(rel: &GraphRelationship, key: &RelationshipKey) -> bool {
    rel.from_node == key.from_node && rel.rel_type == key.rel_type && rel.to_node == key.to_node
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn create_node(&self, name: &str, properties: &PropertyMap) -> AppResult<GraphNode> {
        match self.nodes.entry(name.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(AppError::conflict(format!("Node '{name}' already exists")))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let node = GraphNode {
                    name: name.to_string(),
                    properties: properties.clone(),
                };
                slot.insert(node.clone());
                Ok(node)
            }
        }
    }

    async fn find_node(&self, name: &str) -> AppResult<Option<GraphNode>> {
        Ok(self.nodes.get(name).map(|n| n.clone()))
    }

    async fn merge_node_properties(
        &self,
        name: &str,
        set: &PropertyMap,
        remove: &[String],
    ) -> AppResult<Option<GraphNode>> {
        Ok(self.nodes.get_mut(name).map(|mut node| {
            apply_property_changes(&mut node.properties, set, remove);
            node.clone()
        }))
    }

    async fn upsert_node(
        &self,
        name: &str,
        set: &PropertyMap,
        remove: &[String],
    ) -> AppResult<GraphNode> {
        let mut node = self
            .nodes
            .entry(name.to_string())
            .or_insert_with(|| GraphNode {
                name: name.to_string(),
                properties: PropertyMap::new(),
            });
        apply_property_changes(&mut node.properties, set, remove);
        Ok(node.clone())
    }

    async fn delete_node(&self, name: &str) -> AppResult<bool> {
        if self.nodes.remove(name).is_none() {
            return Ok(false);
        }
        self.relationships
            .write()
            .await
            .retain(|rel| rel.from_node != name && rel.to_node != name);
        Ok(true)
    }

    async fn list_nodes(&self, visibility: &NodeVisibility) -> AppResult<Vec<GraphNode>> {
        let mut nodes: Vec<GraphNode> = self
            .nodes
            .iter()
            .filter(|n| visibility.admits(n))
            .map(|n| n.clone())
            .collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(nodes)
    }

    async fn create_relationship(&self, relationship: &GraphRelationship) -> AppResult<bool> {
        validate_relationship_type(&relationship.rel_type)?;
        let mut relationships = self.relationships.write().await;
        if !self.nodes.contains_key(&relationship.from_node)
            || !self.nodes.contains_key(&relationship.to_node)
        {
            return Ok(false);
        }
        relationships.push(relationship.clone());
        Ok(true)
    }

    async fn find_relationship(
        &self,
        key: &RelationshipKey,
    ) -> AppResult<Option<GraphRelationship>> {
        validate_relationship_type(&key.rel_type)?;
        Ok(self
            .relationships
            .read()
            .await
            .iter()
            .find(|rel| matches_key(rel, key))
            .cloned())
    }

    async fn update_relationships(
        &self,
        key: &RelationshipKey,
        set: &PropertyMap,
        remove: &[String],
    ) -> AppResult<u64> {
        validate_relationship_type(&key.rel_type)?;
        let mut updated = 0;
        for rel in self
            .relationships
            .write()
            .await
            .iter_mut()
            .filter(|rel| matches_key(rel, key))
        {
            apply_property_changes(&mut rel.properties, set, remove);
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete_relationships(&self, key: &RelationshipKey) -> AppResult<u64> {
        validate_relationship_type(&key.rel_type)?;
        let mut relationships = self.relationships.write().await;
        let before = relationships.len();
        relationships.retain(|rel| !matches_key(rel, key));
        Ok((before - relationships.len()) as u64)
    }

    async fn list_relationships_among(
        &self,
        names: &[String],
    ) -> AppResult<Vec<GraphRelationship>> {
        Ok(self
            .relationships
            .read()
            .await
            .iter()
            .filter(|rel| names.contains(&rel.from_node) && names.contains(&rel.to_node))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annograph_core::ErrorKind;
    use serde_json::json;

    fn props(value: serde_json::Value) -> PropertyMap {
        match value {
            serde_json::Value::Object(map) => map,
            _ => PropertyMap::new(),
        }
    }

    fn rel(from: &str, rel_type: &str, to: &str) -> GraphRelationship {
        GraphRelationship {
            from_node: from.to_string(),
            to_node: to.to_string(),
            rel_type: rel_type.to_string(),
            properties: PropertyMap::new(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_node_conflicts() {
        let graph = MemoryGraphStore::new();
        graph.create_node("a", &PropertyMap::new()).await.unwrap();
        let err = graph.create_node("a", &PropertyMap::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_merge_sets_then_removes() {
        let graph = MemoryGraphStore::new();
        graph
            .create_node("a", &props(json!({"label": "adder", "ownerUserId": "u1"})))
            .await
            .unwrap();

        let node = graph
            .merge_node_properties(
                "a",
                &props(json!({"space": "organization_public", "label": "full adder"})),
                &["ownerUserId".to_string()],
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(node.properties["label"], "full adder");
        assert_eq!(node.properties["space"], "organization_public");
        assert!(!node.properties.contains_key("ownerUserId"));

        let missing = graph
            .merge_node_properties("nope", &PropertyMap::new(), &[])
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let graph = MemoryGraphStore::new();
        let set = props(json!({"space": "platform_public"}));
        let remove = vec!["ownerUserId".to_string()];
        let first = graph.upsert_node("a", &set, &remove).await.unwrap();
        let second = graph.upsert_node("a", &set, &remove).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.node_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_node_detaches_relationships() {
        let graph = MemoryGraphStore::new();
        for name in ["a", "b", "c"] {
            graph.create_node(name, &PropertyMap::new()).await.unwrap();
        }
        assert!(graph.create_relationship(&rel("a", "FEEDS", "b")).await.unwrap());
        assert!(graph.create_relationship(&rel("b", "FEEDS", "c")).await.unwrap());

        assert!(graph.delete_node("b").await.unwrap());
        assert!(!graph.delete_node("b").await.unwrap());
        let names: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert!(graph.list_relationships_among(&names).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relationship_requires_both_endpoints() {
        let graph = MemoryGraphStore::new();
        graph.create_node("a", &PropertyMap::new()).await.unwrap();
        assert!(!graph.create_relationship(&rel("a", "FEEDS", "ghost")).await.unwrap());
    }

    #[tokio::test]
    async fn test_relationship_key_operations() {
        let graph = MemoryGraphStore::new();
        for name in ["a", "b"] {
            graph.create_node(name, &PropertyMap::new()).await.unwrap();
        }
        graph.create_relationship(&rel("a", "FEEDS", "b")).await.unwrap();
        graph.create_relationship(&rel("a", "FEEDS", "b")).await.unwrap();
        graph.create_relationship(&rel("a", "DRIVES", "b")).await.unwrap();

        let key = RelationshipKey::new("a", "FEEDS", "b");
        let updated = graph
            .update_relationships(&key, &props(json!({"weight": 2})), &[])
            .await
            .unwrap();
        assert_eq!(updated, 2);
        let found = graph.find_relationship(&key).await.unwrap().unwrap();
        assert_eq!(found.properties["weight"], 2);

        assert_eq!(graph.delete_relationships(&key).await.unwrap(), 2);
        assert!(graph.find_relationship(&key).await.unwrap().is_none());
        let bad = RelationshipKey::new("a", "x y", "b");
        assert_eq!(
            graph.delete_relationships(&bad).await.unwrap_err().kind,
            ErrorKind::Validation
        );
    }
}

//! Graph relationships.

use serde::{Deserialize, Serialize};

use super::node::PropertyMap;

/// Natural key of a relationship. Several relationships may share it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipKey {
    /// Source node name.
    pub from_node: String,
    /// Relationship type.
    pub rel_type: String,
    /// Target node name.
    pub to_node: String,
}

impl RelationshipKey {
    /// Build a key.
    pub fn new(
        from_node: impl Into<String>,
        rel_type: impl Into<String>,
        to_node: impl Into<String>,
    ) -> Self {
        Self {
            from_node: from_node.into(),
            rel_type: rel_type.into(),
            to_node: to_node.into(),
        }
    }
}

/// A directed, typed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRelationship {
    /// Source node name.
    pub from_node: String,
    /// Target node name.
    pub to_node: String,
    /// Relationship type.
    pub rel_type: String,
    /// Edge properties.
    pub properties: PropertyMap,
}

impl GraphRelationship {
    /// The natural key of this relationship.
    pub fn key(&self) -> RelationshipKey {
        RelationshipKey::new(&self.from_node, &self.rel_type, &self.to_node)
    }
}

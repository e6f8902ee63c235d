//! Graph node and relationship values.

pub mod node;
pub mod relationship;
pub mod visibility;

pub use node::{
    GraphNode, NodePermissions, OWNER_ORGANIZATION_KEY, OWNER_USER_KEY, PropertyMap, RESERVED_KEYS,
    SPACE_KEY, is_reserved_key,
};
pub use relationship::{GraphRelationship, RelationshipKey};
pub use visibility::NodeVisibility;

//! Graph nodes and their mirrored permission properties.

use annograph_core::types::{OrganizationId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::folder::{Folder, Space};

/// Property bag of a node or relationship.
pub type PropertyMap = serde_json::Map<String, Value>;

/// Node property holding the owning folder's space.
pub const SPACE_KEY: &str = "space";
/// Node property holding the owning user.
pub const OWNER_USER_KEY: &str = "ownerUserId";
/// Node property holding the owning organization.
pub const OWNER_ORGANIZATION_KEY: &str = "ownerOrganizationId";

/// Keys only written by propagation and resync.
pub const RESERVED_KEYS: [&str; 3] = [SPACE_KEY, OWNER_USER_KEY, OWNER_ORGANIZATION_KEY];

/// A graph vertex keyed by the storage path of its image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique node name.
    pub name: String,
    /// Node properties, including the mirrored permission keys.
    pub properties: PropertyMap,
}

impl GraphNode {
    /// The mirrored space, if present and recognized.
    pub fn space(&self) -> Option<Space> {
        self.properties
            .get(SPACE_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// The mirrored owner user, if present.
    pub fn owner_user_id(&self) -> Option<UserId> {
        self.properties
            .get(OWNER_USER_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }

    /// The mirrored owner organization, if present.
    pub fn owner_organization_id(&self) -> Option<OrganizationId> {
        self.properties
            .get(OWNER_ORGANIZATION_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }
}

/// Permission properties a node mirrors from its folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePermissions {
    /// Folder space.
    pub space: Space,
    /// Folder owner user.
    pub owner_user_id: Option<UserId>,
    /// Folder owner organization.
    pub owner_organization_id: Option<OrganizationId>,
}

impl NodePermissions {
    /// Derive the properties from the folder's current classification.
    pub fn from_folder(folder: &Folder) -> Self {
        Self {
            space: folder.space,
            owner_user_id: folder.owner_user_id,
            owner_organization_id: folder.owner_organization_id,
        }
    }

    /// Keys to set on the node. Absent owners are left out.
    pub fn to_properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert(SPACE_KEY.to_string(), Value::from(self.space.as_str()));
        if let Some(user) = self.owner_user_id {
            props.insert(OWNER_USER_KEY.to_string(), Value::from(user.to_string()));
        }
        if let Some(org) = self.owner_organization_id {
            props.insert(OWNER_ORGANIZATION_KEY.to_string(), Value::from(org.to_string()));
        }
        props
    }

    /// Owner keys that must not remain on the node.
    pub fn keys_to_remove(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if self.owner_user_id.is_none() {
            keys.push(OWNER_USER_KEY.to_string());
        }
        if self.owner_organization_id.is_none() {
            keys.push(OWNER_ORGANIZATION_KEY.to_string());
        }
        keys
    }
}

/// Whether a property key is reserved for permission mirroring.
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

//! Node visibility scopes for listing.

use annograph_core::types::{OrganizationId, UserId};

use super::node::GraphNode;
use crate::folder::Space;

/// Which nodes a caller may list, evaluated on mirrored properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeVisibility {
    /// Every node (platform admins).
    All,
    /// Platform-public nodes, the user's own nodes, and nodes of the
    /// listed organizations.
    Scoped {
        /// The caller.
        user_id: UserId,
        /// Organizations the caller belongs to.
        organization_ids: Vec<OrganizationId>,
    },
}

impl NodeVisibility {
    /// Check whether the node falls inside this scope.
    pub fn admits(&self, node: &GraphNode) -> bool {
        let (user_id, organization_ids) = match self {
            Self::All => return true,
            Self::Scoped {
                user_id,
                organization_ids,
            } => (user_id, organization_ids),
        };
        match node.space() {
            Some(Space::PlatformPublic) => true,
            Some(Space::UserPublic | Space::UserPrivate) => {
                node.owner_user_id() == Some(*user_id)
            }
            Some(Space::OrganizationPublic) => node
                .owner_organization_id()
                .is_some_and(|org| organization_ids.contains(&org)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folder::{CreateFolder, Folder};
    use crate::graph::NodePermissions;

    fn node_for(folder: &Folder) -> GraphNode {
        GraphNode {
            name: format!("n-{}", folder.id),
            properties: NodePermissions::from_folder(folder).to_properties(),
        }
    }

    #[test]
    fn test_scoped_visibility() {
        let me = UserId::new();
        let org = OrganizationId::new();
        let scope = NodeVisibility::Scoped {
            user_id: me,
            organization_ids: vec![org],
        };

        let public = node_for(&Folder::from_create(CreateFolder::for_platform("p")));
        let mine = node_for(&Folder::from_create(CreateFolder::for_user("m", Space::UserPrivate, me)));
        let theirs = node_for(&Folder::from_create(CreateFolder::for_user(
            "t",
            Space::UserPublic,
            UserId::new(),
        )));
        let my_org = node_for(&Folder::from_create(CreateFolder::for_organization("o", org)));
        let other_org = node_for(&Folder::from_create(CreateFolder::for_organization(
            "x",
            OrganizationId::new(),
        )));

        assert!(scope.admits(&public));
        assert!(scope.admits(&mine));
        assert!(!scope.admits(&theirs));
        assert!(scope.admits(&my_org));
        assert!(!scope.admits(&other_org));
        assert!(NodeVisibility::All.admits(&theirs));
    }

    #[test]
    fn test_unclassified_node_hidden() {
        let scope = NodeVisibility::Scoped {
            user_id: UserId::new(),
            organization_ids: Vec::new(),
        };
        let bare = GraphNode {
            name: "bare".to_string(),
            properties: Default::default(),
        };
        assert!(!scope.admits(&bare));
    }
}

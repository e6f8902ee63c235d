//! The permission engine.
//!
//! Decision order for a folder:
//! 1. No caller: `NotLoggedIn`.
//! 2. Platform admin: allowed.
//! 3. By classification:
//!    - platform public: READ allowed, WRITE denied
//!    - organization public: members READ, organization admins WRITE
//!    - user public / user private: only the owner, for both capabilities
//!
//! Graph nodes carry no ACL of their own; a node check resolves the owning
//! folder and applies the folder rules.

use std::sync::Arc;

use tracing::debug;

use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_core::types::OrganizationId;
use annograph_database::store::MembershipStore;
use annograph_entity::folder::Folder;
use annograph_entity::graph::NodeVisibility;
use annograph_entity::permission::Permission;
use annograph_entity::user::AuthUser;

use super::classifier::{Classification, classify};
use super::resolver::{GraphResourceResolver, ResolvedNode};

/// Decides READ/WRITE access to folders and graph nodes.
#[derive(Clone)]
pub struct PermissionEngine {
    membership: Arc<dyn MembershipStore>,
    resolver: GraphResourceResolver,
}

impl std::fmt::Debug for PermissionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionEngine").finish()
    }
}

impl PermissionEngine {
    /// Create an engine over the membership store and node resolver.
    pub fn new(membership: Arc<dyn MembershipStore>, resolver: GraphResourceResolver) -> Self {
        Self {
            membership,
            resolver,
        }
    }

    /// The node resolver this engine uses.
    pub fn resolver(&self) -> &GraphResourceResolver {
        &self.resolver
    }

    /// Require a logged-in caller.
    pub fn require_user(user: Option<&AuthUser>) -> AppResult<&AuthUser> {
        user.ok_or_else(AppError::not_logged_in)
    }

    /// Require a logged-in platform admin.
    pub fn require_platform_admin(user: Option<&AuthUser>) -> AppResult<&AuthUser> {
        let user = Self::require_user(user)?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(AppError::authorization("Platform administrator role required"))
        }
    }

    /// Check a capability on a folder.
    pub async fn check_folder_permission(
        &self,
        folder: &Folder,
        user: Option<&AuthUser>,
        required: Permission,
    ) -> AppResult<()> {
        let user = Self::require_user(user)?;
        if user.is_admin() {
            return Ok(());
        }

        match classify(folder)? {
            Classification::PlatformPublic => match required {
                Permission::Read => Ok(()),
                Permission::Write => Err(AppError::authorization(
                    "Platform space can only be modified by administrators",
                )),
            },
            Classification::OrganizationPublic(org_id) => {
                match self.membership.role_of(user.id, org_id).await? {
                    None => {
                        debug!(user_id = %user.id, org_id = %org_id, "Caller is not a member");
                        Err(AppError::authorization(
                            "You are not a member of the organization owning this folder",
                        ))
                    }
                    Some(role) if required == Permission::Write && !role.is_admin() => {
                        Err(AppError::authorization(
                            "Only organization admins may modify this folder",
                        ))
                    }
                    Some(_) => Ok(()),
                }
            }
            Classification::UserPublic(owner) | Classification::UserPrivate(owner) => {
                if owner == user.id {
                    Ok(())
                } else {
                    Err(AppError::authorization(
                        "This folder belongs to another user",
                    ))
                }
            }
        }
    }

    /// Check a capability on a graph node and return the rows behind it.
    ///
    /// The node's image and folder must resolve even for platform admins.
    pub async fn authorize_node(
        &self,
        node_name: &str,
        user: Option<&AuthUser>,
        required: Permission,
    ) -> AppResult<ResolvedNode> {
        Self::require_user(user)?;
        let resolved = self.resolver.resolve(node_name).await?;
        self.check_folder_permission(&resolved.folder, user, required)
            .await?;
        Ok(resolved)
    }

    /// Check a capability on a graph node.
    pub async fn check_node_permission(
        &self,
        node_name: &str,
        user: Option<&AuthUser>,
        required: Permission,
    ) -> AppResult<()> {
        self.authorize_node(node_name, user, required).await?;
        Ok(())
    }

    /// Require the caller to administer the organization.
    pub async fn check_organization_admin(
        &self,
        org_id: OrganizationId,
        user: Option<&AuthUser>,
    ) -> AppResult<()> {
        let user = Self::require_user(user)?;
        if user.is_admin() {
            return Ok(());
        }
        match self.membership.role_of(user.id, org_id).await? {
            Some(role) if role.is_admin() => Ok(()),
            _ => Err(AppError::authorization(
                "Organization administrator role required",
            )),
        }
    }

    /// Require the caller to belong to the organization.
    pub async fn check_organization_member(
        &self,
        org_id: OrganizationId,
        user: Option<&AuthUser>,
    ) -> AppResult<()> {
        let user = Self::require_user(user)?;
        if user.is_admin() {
            return Ok(());
        }
        match self.membership.role_of(user.id, org_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::authorization(
                "You are not a member of this organization",
            )),
        }
    }

    /// The node scope a caller may list.
    pub async fn node_visibility(&self, user: Option<&AuthUser>) -> AppResult<NodeVisibility> {
        let user = Self::require_user(user)?;
        if user.is_admin() {
            return Ok(NodeVisibility::All);
        }
        Ok(NodeVisibility::Scoped {
            user_id: user.id,
            organization_ids: self.membership.organization_ids_of(user.id).await?,
        })
    }
}

#[cfg(test)]
mod tests;

//! Organization management and membership.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use annograph_auth::PermissionEngine;
use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_core::types::{OrganizationId, UserId};
use annograph_database::store::{OrganizationStore, UserStore};
use annograph_entity::organization::{MemberProfile, OrgRole, Organization, OrganizationMember};

use crate::context::RequestContext;

/// Request to create an organization.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateOrganizationRequest {
    /// Unique organization name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
}

/// Request to update an organization. `None` keeps the current value.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct UpdateOrganizationRequest {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Request to add a user to an organization.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InviteMemberRequest {
    /// Login account of the invitee.
    pub account: String,
    /// Role to grant.
    pub role: OrgRole,
}

/// Manages organizations.
#[derive(Clone)]
pub struct OrganizationService {
    organizations: Arc<dyn OrganizationStore>,
    users: Arc<dyn UserStore>,
    engine: PermissionEngine,
}

impl std::fmt::Debug for OrganizationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrganizationService").finish_non_exhaustive()
    }
}

impl OrganizationService {
    /// Creates a new organization service.
    pub fn new(
        organizations: Arc<dyn OrganizationStore>,
        users: Arc<dyn UserStore>,
        engine: PermissionEngine,
    ) -> Self {
        Self {
            organizations,
            users,
            engine,
        }
    }

    /// Creates an organization with the caller as its owner and first admin.
    pub async fn create_organization(
        &self,
        ctx: &RequestContext,
        req: CreateOrganizationRequest,
    ) -> AppResult<Organization> {
        let user = *ctx.require_user()?;

        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Organization name cannot be empty"));
        }
        if self.organizations.find_by_name(name).await?.is_some() {
            return Err(AppError::conflict(format!(
                "Organization '{name}' already exists"
            )));
        }

        let org = Organization::new(name, req.description, user.id);
        let creator = OrganizationMember::new(org.id, user.id, OrgRole::Admin);
        self.organizations.create(&org, &creator).await?;

        info!(user_id = %user.id, org_id = %org.id, name = %org.name, "Organization created");
        Ok(org)
    }

    /// Updates name or description. Organization admins only.
    pub async fn update_organization(
        &self,
        ctx: &RequestContext,
        org_id: OrganizationId,
        req: UpdateOrganizationRequest,
    ) -> AppResult<Organization> {
        let org = self.find_live(org_id).await?;
        self.engine
            .check_organization_admin(org_id, ctx.user())
            .await?;

        let name = match req.name.as_deref().map(str::trim) {
            Some("") => return Err(AppError::validation("Organization name cannot be empty")),
            Some(name) if name != org.name => {
                if self.organizations.find_by_name(name).await?.is_some() {
                    return Err(AppError::conflict(format!(
                        "Organization '{name}' already exists"
                    )));
                }
                Some(name)
            }
            _ => None,
        };

        let updated = self
            .organizations
            .update(org_id, name, req.description.as_deref())
            .await?
            .ok_or_else(|| AppError::not_found("Organization not found"))?;

        info!(org_id = %org_id, "Organization updated");
        Ok(updated)
    }

    /// Deletes an organization and its memberships. Owner or platform admin.
    pub async fn delete_organization(
        &self,
        ctx: &RequestContext,
        org_id: OrganizationId,
    ) -> AppResult<()> {
        let user = ctx.require_user()?;
        let org = self.find_live(org_id).await?;
        if org.owner_id != user.id && !user.is_admin() {
            return Err(AppError::authorization(
                "Only the owner can delete an organization",
            ));
        }

        self.organizations.soft_delete(org_id).await?;
        info!(user_id = %user.id, org_id = %org_id, "Organization deleted");
        Ok(())
    }

    /// Adds an existing user to the organization.
    pub async fn invite_member(
        &self,
        ctx: &RequestContext,
        org_id: OrganizationId,
        req: InviteMemberRequest,
    ) -> AppResult<OrganizationMember> {
        self.find_live(org_id).await?;
        self.engine
            .check_organization_admin(org_id, ctx.user())
            .await?;

        let invitee = self
            .users
            .find_by_account(req.account.trim())
            .await?
            .ok_or_else(|| AppError::not_found("Invited user does not exist"))?;

        let member = OrganizationMember::new(org_id, invitee.id, req.role);
        self.organizations.add_member(&member).await?;

        info!(
            org_id = %org_id,
            user_id = %invitee.id,
            role = req.role.as_str(),
            "Member added"
        );
        Ok(member)
    }

    /// Removes a member. The owner cannot be removed.
    pub async fn remove_member(
        &self,
        ctx: &RequestContext,
        org_id: OrganizationId,
        member_id: UserId,
    ) -> AppResult<()> {
        let org = self.find_live(org_id).await?;
        self.engine
            .check_organization_admin(org_id, ctx.user())
            .await?;

        if member_id == org.owner_id {
            return Err(AppError::validation(
                "The organization owner cannot be removed",
            ));
        }
        if !self.organizations.remove_member(org_id, member_id).await? {
            return Err(AppError::not_found("User is not a member of this organization"));
        }

        info!(org_id = %org_id, user_id = %member_id, "Member removed");
        Ok(())
    }

    /// Members with their public profiles. Members and platform admins only.
    pub async fn list_members(
        &self,
        ctx: &RequestContext,
        org_id: OrganizationId,
    ) -> AppResult<Vec<MemberProfile>> {
        self.find_live(org_id).await?;
        self.engine
            .check_organization_member(org_id, ctx.user())
            .await?;

        let members = self.organizations.list_members(org_id).await?;
        let ids: Vec<_> = members.iter().map(|m| m.user_id).collect();
        let mut profiles: HashMap<_, _> = self
            .users
            .profiles(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(members
            .into_iter()
            .filter_map(|m| {
                profiles.remove(&m.user_id).map(|user| MemberProfile {
                    user,
                    role: m.role,
                    joined_at: m.joined_at,
                })
            })
            .collect())
    }

    async fn find_live(&self, org_id: OrganizationId) -> AppResult<Organization> {
        self.organizations
            .find_by_id(org_id)
            .await?
            .ok_or_else(|| AppError::not_found("Organization not found"))
    }
}

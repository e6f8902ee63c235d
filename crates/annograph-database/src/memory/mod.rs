//! In-memory implementation of every store trait.
//!
//! Backs the workflow tests and local tooling. Each row lives in a
//! `DashMap`; conditional transitions run under the entry's shard lock so
//! they behave like the single-statement updates of the sqlx repositories.

mod content;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_core::types::{
    AnnotationId, FolderId, ImageId, OrganizationId, UserId,
};
use annograph_entity::annotation::Annotation;
use annograph_entity::folder::Folder;
use annograph_entity::image::Image;
use annograph_entity::organization::{OrgRole, Organization, OrganizationMember};
use annograph_entity::user::{User, UserProfile};

use crate::store::{MembershipStore, OrganizationStore, UserStore};

/// All relational rows held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    organizations: DashMap<OrganizationId, Organization>,
    members: DashMap<(OrganizationId, UserId), OrganizationMember>,
    folders: DashMap<FolderId, Folder>,
    images: DashMap<ImageId, Image>,
    annotations: DashMap<AnnotationId, Annotation>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn org_is_live(&self, org_id: OrganizationId) -> bool {
        self.organizations
            .get(&org_id)
            .is_some_and(|org| !org.is_deleted)
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn role_of(&self, user_id: UserId, org_id: OrganizationId) -> AppResult<Option<OrgRole>> {
        if !self.org_is_live(org_id) {
            return Ok(None);
        }
        Ok(self.members.get(&(org_id, user_id)).map(|m| m.role))
    }

    async fn organization_ids_of(&self, user_id: UserId) -> AppResult<Vec<OrganizationId>> {
        Ok(self
            .members
            .iter()
            .filter(|m| m.user_id == user_id && self.org_is_live(m.organization_id))
            .map(|m| m.organization_id)
            .collect())
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn create(&self, org: &Organization, creator: &OrganizationMember) -> AppResult<()> {
        if self.find_by_name(&org.name).await?.is_some() {
            return Err(AppError::conflict(format!(
                "Organization '{}' already exists",
                org.name
            )));
        }
        self.organizations.insert(org.id, org.clone());
        self.members
            .insert((creator.organization_id, creator.user_id), creator.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: OrganizationId) -> AppResult<Option<Organization>> {
        Ok(self
            .organizations
            .get(&id)
            .filter(|org| !org.is_deleted)
            .map(|org| org.clone()))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Organization>> {
        Ok(self
            .organizations
            .iter()
            .find(|org| !org.is_deleted && org.name == name)
            .map(|org| org.clone()))
    }

    async fn update(
        &self,
        id: OrganizationId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<Option<Organization>> {
        if let Some(name) = name {
            if let Some(existing) = OrganizationStore::find_by_name(self, name).await? {
                if existing.id != id {
                    return Err(AppError::conflict(format!(
                        "Organization '{name}' already exists"
                    )));
                }
            }
        }
        let Some(mut org) = self.organizations.get_mut(&id) else {
            return Ok(None);
        };
        if org.is_deleted {
            return Ok(None);
        }
        if let Some(name) = name {
            org.name = name.to_string();
        }
        if let Some(description) = description {
            org.description = Some(description.to_string());
        }
        org.updated_at = Utc::now();
        Ok(Some(org.clone()))
    }

    async fn soft_delete(&self, id: OrganizationId) -> AppResult<bool> {
        self.members.retain(|(org_id, _), _| *org_id != id);
        let Some(mut org) = self.organizations.get_mut(&id) else {
            return Ok(false);
        };
        if org.is_deleted {
            return Ok(false);
        }
        org.is_deleted = true;
        org.updated_at = Utc::now();
        drop(org);
        self.reject_merges_into(id);
        Ok(true)
    }

    async fn add_member(&self, member: &OrganizationMember) -> AppResult<()> {
        let key = (member.organization_id, member.user_id);
        match self.members.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::conflict(format!(
                "User {} is already a member",
                member.user_id
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(member.clone());
                Ok(())
            }
        }
    }

    async fn remove_member(&self, org_id: OrganizationId, user_id: UserId) -> AppResult<bool> {
        Ok(self.members.remove(&(org_id, user_id)).is_some())
    }

    async fn list_members(&self, org_id: OrganizationId) -> AppResult<Vec<OrganizationMember>> {
        let mut members: Vec<OrganizationMember> = self
            .members
            .iter()
            .filter(|m| m.organization_id == org_id)
            .map(|m| m.clone())
            .collect();
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: &User) -> AppResult<()> {
        if UserStore::find_by_account(self, &user.user_account)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "Account '{}' already exists",
                user.user_account
            )));
        }
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self
            .users
            .get(&id)
            .filter(|u| !u.is_deleted)
            .map(|u| u.clone()))
    }

    async fn find_by_account(&self, account: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| !u.is_deleted && u.user_account == account)
            .map(|u| u.clone()))
    }

    async fn profiles(&self, ids: &[UserId]) -> AppResult<Vec<UserProfile>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id))
            .filter(|u| !u.is_deleted)
            .map(|u| u.profile())
            .collect())
    }
}

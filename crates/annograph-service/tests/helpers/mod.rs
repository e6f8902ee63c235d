//! Shared helpers for service tests. Everything runs on the in-memory
//! stores, so no database is needed.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;

use annograph_core::types::UserId;
use annograph_entity::folder::{Folder, Space};
use annograph_entity::image::{Image, NewImage};
use annograph_entity::organization::{OrgRole, Organization};
use annograph_entity::user::{User, UserRole};
use annograph_graph::GraphStore;
use annograph_service::folder::CreateFolderRequest;
use annograph_service::image::RegisterImageRequest;
use annograph_service::organization::{CreateOrganizationRequest, InviteMemberRequest};
use annograph_service::{RequestContext, Services, Stores, storage_path_for};

/// Test application context.
pub struct TestApp {
    /// Raw stores, for direct inspection.
    pub stores: Stores,
    /// The service set under test.
    pub services: Services,
}

impl TestApp {
    /// Create an application over fresh in-memory stores.
    pub fn new() -> Self {
        Self::from_stores(Stores::in_memory())
    }

    /// Create an application with a custom graph store.
    pub fn with_graph(graph: Arc<dyn GraphStore>) -> Self {
        Self::from_stores(Stores::with_graph(graph))
    }

    fn from_stores(stores: Stores) -> Self {
        let services = Services::new(&stores);
        Self { stores, services }
    }

    /// Insert a user and return a context acting as them.
    pub async fn create_test_user(&self, account: &str, role: UserRole) -> RequestContext {
        let user = User {
            id: UserId::new(),
            user_account: account.to_string(),
            user_name: Some(account.to_string()),
            user_avatar: None,
            user_profile: None,
            user_role: role,
            is_deleted: false,
            created_at: Utc::now(),
        };
        self.stores
            .users
            .create(&user)
            .await
            .expect("Failed to create test user");
        RequestContext::authenticated(user.auth())
    }

    /// Create an organization administered by `admin`.
    pub async fn create_org(&self, admin: &RequestContext, name: &str) -> Organization {
        self.services
            .organizations
            .create_organization(
                admin,
                CreateOrganizationRequest {
                    name: name.to_string(),
                    description: None,
                },
            )
            .await
            .expect("Failed to create organization")
    }

    /// Add the user with `account` to the organization.
    pub async fn add_member(
        &self,
        admin: &RequestContext,
        org: &Organization,
        account: &str,
        role: OrgRole,
    ) {
        self.services
            .organizations
            .invite_member(
                admin,
                org.id,
                InviteMemberRequest {
                    account: account.to_string(),
                    role,
                },
            )
            .await
            .expect("Failed to add member");
    }

    /// Create a folder in one of the caller's own spaces.
    pub async fn user_folder(&self, ctx: &RequestContext, name: &str, space: Space) -> Folder {
        self.services
            .folders
            .create_folder(
                ctx,
                CreateFolderRequest {
                    name: name.to_string(),
                    space,
                    organization_id: None,
                },
            )
            .await
            .expect("Failed to create folder")
    }

    /// Register an upload of `filename` into the folder.
    pub async fn upload(&self, ctx: &RequestContext, folder: &Folder, filename: &str) -> Image {
        self.try_upload(ctx, folder, filename)
            .await
            .expect("Failed to register image")
    }

    /// Register an upload, returning the service result.
    pub async fn try_upload(
        &self,
        ctx: &RequestContext,
        folder: &Folder,
        filename: &str,
    ) -> annograph_core::AppResult<Image> {
        let storage_path = storage_path_for(folder, filename)?;
        self.services
            .images
            .register_image(
                ctx,
                folder.id,
                RegisterImageRequest {
                    image: NewImage {
                        original_filename: filename.to_string(),
                        storage_path,
                        width: Some(640),
                        height: Some(480),
                        file_size: 1024,
                    },
                    annotation: None,
                },
            )
            .await
    }
}

use std::sync::Arc;

use annograph_core::ErrorKind;
use annograph_core::types::{OrganizationId, UserId};
use annograph_database::MemoryStore;
use annograph_database::store::{FolderStore, ImageStore, OrganizationStore};
use annograph_entity::folder::{CreateFolder, Folder, Space};
use annograph_entity::graph::NodeVisibility;
use annograph_entity::image::{Image, NewImage};
use annograph_entity::organization::{OrgRole, Organization, OrganizationMember};
use annograph_entity::permission::Permission;
use annograph_entity::user::{AuthUser, UserRole};

use super::PermissionEngine;
use crate::permission::resolver::GraphResourceResolver;

struct Fixture {
    store: Arc<MemoryStore>,
    engine: PermissionEngine,
    org: OrganizationId,
    org_admin: AuthUser,
    org_member: AuthUser,
    outsider: AuthUser,
    platform_admin: AuthUser,
}

fn user() -> AuthUser {
    AuthUser::new(UserId::new(), UserRole::User)
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let resolver = GraphResourceResolver::new(store.clone(), store.clone());
    let engine = PermissionEngine::new(store.clone(), resolver);

    let org_admin = user();
    let org_member = user();
    let organization = Organization::new("lab", None, org_admin.id);
    OrganizationStore::create(
        store.as_ref(),
        &organization,
        &OrganizationMember::new(organization.id, org_admin.id, OrgRole::Admin),
    )
    .await
    .unwrap();
    store
        .add_member(&OrganizationMember::new(
            organization.id,
            org_member.id,
            OrgRole::Member,
        ))
        .await
        .unwrap();

    Fixture {
        store,
        engine,
        org: organization.id,
        org_admin,
        org_member,
        outsider: user(),
        platform_admin: AuthUser::new(UserId::new(), UserRole::Admin),
    }
}

async fn allowed(fx: &Fixture, folder: &Folder, user: &AuthUser, perm: Permission) -> bool {
    match fx.engine.check_folder_permission(folder, Some(user), perm).await {
        Ok(()) => true,
        Err(e) => {
            assert_eq!(e.kind, ErrorKind::Authorization, "{e}");
            false
        }
    }
}

#[tokio::test]
async fn test_platform_public_read_only_for_non_admins() {
    let fx = fixture().await;
    let folder = Folder::from_create(CreateFolder::for_platform("shared"));
    for u in [fx.outsider, fx.org_member, fx.org_admin] {
        assert!(allowed(&fx, &folder, &u, Permission::Read).await);
        assert!(!allowed(&fx, &folder, &u, Permission::Write).await);
    }
}

#[tokio::test]
async fn test_organization_public_by_role() {
    let fx = fixture().await;
    let folder = Folder::from_create(CreateFolder::for_organization("org", fx.org));

    assert!(!allowed(&fx, &folder, &fx.outsider, Permission::Read).await);
    assert!(!allowed(&fx, &folder, &fx.outsider, Permission::Write).await);
    assert!(allowed(&fx, &folder, &fx.org_member, Permission::Read).await);
    assert!(!allowed(&fx, &folder, &fx.org_member, Permission::Write).await);
    assert!(allowed(&fx, &folder, &fx.org_admin, Permission::Read).await);
    assert!(allowed(&fx, &folder, &fx.org_admin, Permission::Write).await);
}

#[tokio::test]
async fn test_user_spaces_owner_only() {
    let fx = fixture().await;
    let owner = user();
    for space in [Space::UserPublic, Space::UserPrivate] {
        let folder = Folder::from_create(CreateFolder::for_user("mine", space, owner.id));
        for perm in [Permission::Read, Permission::Write] {
            assert!(allowed(&fx, &folder, &owner, perm).await);
            for other in [fx.outsider, fx.org_member, fx.org_admin] {
                assert!(!allowed(&fx, &folder, &other, perm).await);
            }
        }
    }
}

#[tokio::test]
async fn test_platform_admin_bypasses_every_space() {
    let fx = fixture().await;
    let folders = [
        Folder::from_create(CreateFolder::for_platform("p")),
        Folder::from_create(CreateFolder::for_organization("o", OrganizationId::new())),
        Folder::from_create(CreateFolder::for_user("u", Space::UserPublic, UserId::new())),
        Folder::from_create(CreateFolder::for_user("v", Space::UserPrivate, UserId::new())),
    ];
    for folder in &folders {
        for perm in [Permission::Read, Permission::Write] {
            assert!(allowed(&fx, folder, &fx.platform_admin, perm).await);
        }
    }
}

#[tokio::test]
async fn test_anonymous_caller_not_logged_in() {
    let fx = fixture().await;
    let folder = Folder::from_create(CreateFolder::for_platform("p"));
    let err = fx
        .engine
        .check_folder_permission(&folder, None, Permission::Read)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);

    let err = fx
        .engine
        .check_organization_admin(fx.org, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
}

#[tokio::test]
async fn test_node_check_matches_folder_check() {
    let fx = fixture().await;
    let owner = user();
    let folders = [
        Folder::from_create(CreateFolder::for_platform("p")),
        Folder::from_create(CreateFolder::for_organization("o", fx.org)),
        Folder::from_create(CreateFolder::for_user("u", Space::UserPublic, owner.id)),
        Folder::from_create(CreateFolder::for_user("v", Space::UserPrivate, owner.id)),
    ];
    let callers = [owner, fx.outsider, fx.org_member, fx.org_admin, fx.platform_admin];

    for (i, folder) in folders.iter().enumerate() {
        FolderStore::create(fx.store.as_ref(), folder).await.unwrap();
        let image = Image::from_new(
            folder.id,
            owner.id,
            NewImage {
                original_filename: "a.png".to_string(),
                storage_path: format!("node-{i}.png"),
                width: Some(4),
                height: Some(4),
                file_size: 16,
            },
        );
        ImageStore::create(fx.store.as_ref(), &image).await.unwrap();

        for caller in &callers {
            for perm in [Permission::Read, Permission::Write] {
                let by_folder = fx
                    .engine
                    .check_folder_permission(folder, Some(caller), perm)
                    .await
                    .map_err(|e| e.kind);
                let by_node = fx
                    .engine
                    .check_node_permission(image.node_name(), Some(caller), perm)
                    .await
                    .map_err(|e| e.kind);
                assert_eq!(by_folder, by_node);
            }
        }
    }
}

#[tokio::test]
async fn test_unresolvable_node_fails_closed() {
    let fx = fixture().await;
    for caller in [fx.outsider, fx.platform_admin] {
        let err = fx
            .engine
            .check_node_permission("ghost.png", Some(&caller), Permission::Read)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    let folder = Folder::from_create(CreateFolder::for_platform("gone"));
    FolderStore::create(fx.store.as_ref(), &folder).await.unwrap();
    let image = Image::from_new(
        folder.id,
        fx.outsider.id,
        NewImage {
            original_filename: "b.png".to_string(),
            storage_path: "orphan.png".to_string(),
            width: None,
            height: None,
            file_size: 1,
        },
    );
    ImageStore::create(fx.store.as_ref(), &image).await.unwrap();
    FolderStore::soft_delete(fx.store.as_ref(), folder.id)
        .await
        .unwrap();

    let err = fx
        .engine
        .check_node_permission("orphan.png", Some(&fx.platform_admin), Permission::Read)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_organization_admin_check() {
    let fx = fixture().await;
    assert!(
        fx.engine
            .check_organization_admin(fx.org, Some(&fx.org_admin))
            .await
            .is_ok()
    );
    assert!(
        fx.engine
            .check_organization_admin(fx.org, Some(&fx.platform_admin))
            .await
            .is_ok()
    );
    for caller in [fx.org_member, fx.outsider] {
        let err = fx
            .engine
            .check_organization_admin(fx.org, Some(&caller))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
    }
}

#[tokio::test]
async fn test_node_visibility_scope() {
    let fx = fixture().await;
    assert_eq!(
        fx.engine
            .node_visibility(Some(&fx.platform_admin))
            .await
            .unwrap(),
        NodeVisibility::All
    );
    assert_eq!(
        fx.engine.node_visibility(Some(&fx.org_member)).await.unwrap(),
        NodeVisibility::Scoped {
            user_id: fx.org_member.id,
            organization_ids: vec![fx.org],
        }
    );
}

#[tokio::test]
async fn test_require_platform_admin() {
    let fx = fixture().await;
    assert!(PermissionEngine::require_platform_admin(Some(&fx.platform_admin)).is_ok());
    assert_eq!(
        PermissionEngine::require_platform_admin(Some(&fx.org_admin))
            .unwrap_err()
            .kind,
        ErrorKind::Authorization
    );
}

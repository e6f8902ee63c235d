//! Folder creation rules and visibility.

mod helpers;

use serde_json::json;

use annograph_core::ErrorKind;
use annograph_core::types::PageRequest;
use annograph_entity::folder::{MergeState, Space};
use annograph_entity::graph::{OWNER_ORGANIZATION_KEY, OWNER_USER_KEY, PropertyMap, SPACE_KEY};
use annograph_entity::organization::OrgRole;
use annograph_entity::user::UserRole;
use annograph_service::RequestContext;
use annograph_service::folder::{CopyFolderRequest, CreateFolderRequest};
use annograph_service::graph::UpdateNodeRequest;

use helpers::TestApp;

fn request(name: &str, space: Space) -> CreateFolderRequest {
    CreateFolderRequest {
        name: name.to_string(),
        space,
        organization_id: None,
    }
}

#[tokio::test]
async fn test_create_folder_validation() {
    let app = TestApp::new();
    let user = app.create_test_user("alice", UserRole::User).await;
    let admin = app.create_test_user("root", UserRole::Admin).await;

    let err = app
        .services
        .folders
        .create_folder(&RequestContext::anonymous(), request("x", Space::UserPrivate))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);

    let err = app
        .services
        .folders
        .create_folder(&user, request("  ", Space::UserPrivate))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app
        .services
        .folders
        .create_folder(&user, request("shared", Space::OrganizationPublic))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app
        .services
        .folders
        .create_folder(&user, request("library", Space::PlatformPublic))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let platform = app
        .services
        .folders
        .create_folder(&admin, request("library", Space::PlatformPublic))
        .await
        .unwrap();
    assert_eq!(platform.owner_user_id, None);
    assert_eq!(platform.owner_organization_id, None);

    let mine = app
        .services
        .folders
        .create_folder(&user, request("  circuits  ", Space::UserPublic))
        .await
        .unwrap();
    assert_eq!(mine.name, "circuits");
    assert_eq!(mine.owner_user_id, user.user.map(|u| u.id));
    assert_eq!(mine.merge_state, MergeState::None);
}

#[tokio::test]
async fn test_visible_folders() {
    let app = TestApp::new();
    let admin = app.create_test_user("root", UserRole::Admin).await;
    let alice = app.create_test_user("alice", UserRole::User).await;
    let eve = app.create_test_user("eve", UserRole::User).await;
    let bob = app.create_test_user("bob", UserRole::User).await;

    let org = app.create_org(&bob, "lab").await;
    app.add_member(&bob, &org, "alice", OrgRole::Member).await;

    let platform = app
        .services
        .folders
        .create_folder(&admin, request("library", Space::PlatformPublic))
        .await
        .unwrap();
    let shared = app
        .services
        .folders
        .create_folder(
            &bob,
            CreateFolderRequest {
                name: "shared".to_string(),
                space: Space::OrganizationPublic,
                organization_id: Some(org.id),
            },
        )
        .await
        .unwrap();
    let private = app.user_folder(&alice, "private", Space::UserPrivate).await;
    let eves = app.user_folder(&eve, "eve's", Space::UserPublic).await;

    let mut seen: Vec<_> = app
        .services
        .folders
        .list_visible_folders(&alice)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    seen.sort();
    let mut expected = vec![platform.id, shared.id, private.id];
    expected.sort();
    assert_eq!(seen, expected);

    let eve_view = app.services.folders.list_visible_folders(&eve).await.unwrap();
    assert_eq!(eve_view.len(), 2);
    assert!(eve_view.iter().any(|f| f.id == eves.id));

    let everything = app.services.folders.list_visible_folders(&admin).await.unwrap();
    assert_eq!(everything.len(), 4);
}

#[tokio::test]
async fn test_rename_folder() {
    let app = TestApp::new();
    let alice = app.create_test_user("alice", UserRole::User).await;
    let eve = app.create_test_user("eve", UserRole::User).await;
    let admin = app.create_test_user("root", UserRole::Admin).await;
    let folder = app.user_folder(&alice, "draft", Space::UserPrivate).await;

    let err = app
        .services
        .folders
        .rename_folder(&eve, folder.id, "mine")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = app
        .services
        .folders
        .rename_folder(&alice, folder.id, "")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let renamed = app
        .services
        .folders
        .rename_folder(&alice, folder.id, "final")
        .await
        .unwrap();
    assert_eq!(renamed.name, "final");

    // Platform admins pass every folder check.
    app.services
        .folders
        .rename_folder(&admin, folder.id, "audited")
        .await
        .unwrap();
}

fn copy_into(space: Space) -> CopyFolderRequest {
    CopyFolderRequest {
        target_space: space,
        name: None,
    }
}

#[tokio::test]
async fn test_copy_folder_requires_read_and_user_space() {
    let app = TestApp::new();
    let owner = app.create_test_user("alice", UserRole::User).await;
    let stranger = app.create_test_user("eve", UserRole::User).await;
    let folder = app.user_folder(&owner, "private", Space::UserPrivate).await;
    app.upload(&owner, &folder, "amp.png").await;

    let err = app
        .services
        .folders
        .copy_folder(&stranger, folder.id, copy_into(Space::UserPrivate))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    for space in [Space::OrganizationPublic, Space::PlatformPublic] {
        let err = app
            .services
            .folders
            .copy_folder(&owner, folder.id, copy_into(space))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    let err = app
        .services
        .folders
        .copy_folder(
            &owner,
            folder.id,
            CopyFolderRequest {
                target_space: Space::UserPublic,
                name: Some("   ".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    // Nothing was created by the refused copies.
    let visible = app.services.folders.list_visible_folders(&owner).await.unwrap();
    assert_eq!(visible.len(), 1);
}

#[tokio::test]
async fn test_copy_folder_takes_permission_keys_from_new_folder() {
    let app = TestApp::new();
    let org_admin = app.create_test_user("bob", UserRole::User).await;
    let member = app.create_test_user("dave", UserRole::User).await;
    let org = app.create_org(&org_admin, "lab").await;
    app.add_member(&org_admin, &org, "dave", OrgRole::Member).await;

    let shared = app
        .services
        .folders
        .create_folder(
            &org_admin,
            CreateFolderRequest {
                name: "boards".to_string(),
                space: Space::OrganizationPublic,
                organization_id: Some(org.id),
            },
        )
        .await
        .unwrap();
    let image = app.upload(&org_admin, &shared, "amp.png").await;

    let mut set = PropertyMap::new();
    set.insert("gain".to_string(), json!(10));
    app.services
        .nodes
        .update_node(
            &org_admin,
            &image.storage_path,
            UpdateNodeRequest {
                set,
                remove: vec![],
            },
        )
        .await
        .unwrap();
    let annotation = app
        .services
        .annotations
        .get_annotation_by_image(&org_admin, image.id)
        .await
        .unwrap()
        .unwrap();
    app.services
        .annotations
        .update_annotation(&org_admin, annotation.id, json!({"parts": ["R1", "C2"]}))
        .await
        .unwrap();

    // A member may read the folder, so they may copy it.
    let copy = app
        .services
        .folders
        .copy_folder(&member, shared.id, copy_into(Space::UserPrivate))
        .await
        .unwrap();
    let member_id = member.user().map(|u| u.id);
    assert_eq!(copy.name, "boards_copy");
    assert_eq!(copy.space, Space::UserPrivate);
    assert_eq!(copy.owner_user_id, member_id);
    assert_eq!(copy.owner_organization_id, None);

    let images = app
        .services
        .images
        .list_images(&member, copy.id, None, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(images.items.len(), 1);
    let copied = &images.items[0];
    assert_eq!(copied.original_filename, "amp.png");
    assert_ne!(copied.storage_path, image.storage_path);
    assert!(copied.storage_path.starts_with(&format!("user/{}/", member_id.unwrap())));

    let node = app
        .services
        .nodes
        .find_node(&member, &copied.storage_path)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(node.properties["gain"], json!(10));
    assert_eq!(node.properties[SPACE_KEY], "user_private");
    assert_eq!(node.properties[OWNER_USER_KEY], member_id.unwrap().to_string());
    assert!(!node.properties.contains_key(OWNER_ORGANIZATION_KEY));

    let copied_annotation = app
        .services
        .annotations
        .get_annotation_by_image(&member, copied.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(copied_annotation.content, json!({"parts": ["R1", "C2"]}));

    // The source is untouched and the admin cannot reach the private copy.
    let source_node = app
        .services
        .nodes
        .find_node(&org_admin, &image.storage_path)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(source_node.properties[SPACE_KEY], "organization_public");
    let err = app
        .services
        .folders
        .get_folder(&org_admin, copy.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

//! Image, annotation and folder-deletion workflows.

mod helpers;

use serde_json::json;

use annograph_core::ErrorKind;
use annograph_core::types::{AnnotationId, ImageId, PageRequest, UserId};
use annograph_entity::annotation::Annotation;
use annograph_entity::folder::Space;
use annograph_entity::graph::{OWNER_USER_KEY, SPACE_KEY};
use annograph_entity::image::NewImage;
use annograph_entity::user::UserRole;
use annograph_service::folder::CreateFolderRequest;
use annograph_service::image::RegisterImageRequest;

use helpers::TestApp;

#[tokio::test]
async fn test_register_creates_node_and_empty_annotation() {
    let app = TestApp::new();
    let owner = app.create_test_user("alice", UserRole::User).await;
    let folder = app.user_folder(&owner, "mine", Space::UserPrivate).await;

    let image = app.upload(&owner, &folder, "amp.png").await;
    assert!(image.storage_path.starts_with("user/"));

    let node = app
        .stores
        .graph
        .find_node(&image.storage_path)
        .await
        .unwrap()
        .expect("node created with the image");
    assert_eq!(node.properties[SPACE_KEY], "user_private");
    assert_eq!(
        node.properties[OWNER_USER_KEY],
        owner.user.unwrap().id.to_string()
    );

    let annotation = app
        .services
        .annotations
        .get_annotation_by_image(&owner, image.id)
        .await
        .unwrap()
        .expect("annotation created with the image");
    assert_eq!(annotation.content, json!({}));
}

#[tokio::test]
async fn test_register_with_annotation_document() {
    let app = TestApp::new();
    let owner = app.create_test_user("alice", UserRole::User).await;
    let folder = app.user_folder(&owner, "mine", Space::UserPrivate).await;

    let document = json!({ "cpnts": [{ "type": "resistor", "name": "resistor_0" }] });
    let image = app
        .services
        .images
        .register_image(
            &owner,
            folder.id,
            RegisterImageRequest {
                image: NewImage {
                    original_filename: "board.png".to_string(),
                    storage_path: format!("user/{}/abcd1234-board.png", owner.user.unwrap().id),
                    width: None,
                    height: None,
                    file_size: 10,
                },
                annotation: Some(document.clone()),
            },
        )
        .await
        .unwrap();

    let annotation = app
        .services
        .annotations
        .get_annotation_by_image(&owner, image.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(annotation.content, document);
}

#[tokio::test]
async fn test_register_requires_folder_write() {
    let app = TestApp::new();
    let owner = app.create_test_user("alice", UserRole::User).await;
    let other = app.create_test_user("eve", UserRole::User).await;
    let admin = app.create_test_user("root", UserRole::Admin).await;

    let mine = app.user_folder(&owner, "mine", Space::UserPublic).await;
    let err = app.try_upload(&other, &mine, "x.png").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let platform = app
        .services
        .folders
        .create_folder(
            &admin,
            CreateFolderRequest {
                name: "library".to_string(),
                space: Space::PlatformPublic,
                organization_id: None,
            },
        )
        .await
        .unwrap();
    let err = app.try_upload(&owner, &platform, "x.png").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let image = app.upload(&admin, &platform, "x.png").await;
    assert!(image.storage_path.starts_with("public/"));

    // Anyone logged in can read platform content.
    app.services.images.get_image(&other, image.id).await.unwrap();
}

#[tokio::test]
async fn test_duplicate_storage_path_conflicts() {
    let app = TestApp::new();
    let owner = app.create_test_user("alice", UserRole::User).await;
    let folder = app.user_folder(&owner, "mine", Space::UserPrivate).await;
    let image = app.upload(&owner, &folder, "amp.png").await;

    let request = RegisterImageRequest {
        image: NewImage {
            original_filename: "copy.png".to_string(),
            storage_path: image.storage_path.clone(),
            width: None,
            height: None,
            file_size: 1,
        },
        annotation: None,
    };
    let err = app
        .services
        .images
        .register_image(&owner, folder.id, request)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    // The original image and node are untouched.
    app.services.images.get_image(&owner, image.id).await.unwrap();
    assert!(
        app.stores
            .graph
            .find_node(&image.storage_path)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_delete_image_twice_is_noop() {
    let app = TestApp::new();
    let owner = app.create_test_user("alice", UserRole::User).await;
    let other = app.create_test_user("eve", UserRole::User).await;
    let folder = app.user_folder(&owner, "mine", Space::UserPrivate).await;
    let image = app.upload(&owner, &folder, "amp.png").await;

    let err = app
        .services
        .images
        .delete_image(&other, image.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    app.services.images.delete_image(&owner, image.id).await.unwrap();
    app.services.images.delete_image(&owner, image.id).await.unwrap();

    assert!(
        app.stores
            .graph
            .find_node(&image.storage_path)
            .await
            .unwrap()
            .is_none()
    );
    let err = app
        .services
        .images
        .get_image(&owner, image.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // Polling the annotation of a deleted image is not an error.
    let annotation = app
        .services
        .annotations
        .get_annotation_by_image(&owner, image.id)
        .await
        .unwrap();
    assert!(annotation.is_none());
}

#[tokio::test]
async fn test_batch_delete_rejects_empty_list() {
    let app = TestApp::new();
    let owner = app.create_test_user("alice", UserRole::User).await;
    let err = app
        .services
        .images
        .delete_images_batch(&owner, &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    // Unknown ids are skipped like single deletes.
    app.services
        .images
        .delete_images_batch(&owner, &[ImageId::new()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_rename_and_lookup_by_name() {
    let app = TestApp::new();
    let owner = app.create_test_user("alice", UserRole::User).await;
    let other = app.create_test_user("eve", UserRole::User).await;
    let folder = app.user_folder(&owner, "mine", Space::UserPrivate).await;

    for name in ["amp_1.png", "amp_2.png", "filter.png"] {
        app.upload(&owner, &folder, name).await;
    }

    let page = app
        .services
        .images
        .list_images(&owner, folder.id, None, PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.total_items, 3);
    assert_eq!(page.items.len(), 2);
    assert!(page.has_next());

    let filtered = app
        .services
        .images
        .list_images(&owner, folder.id, Some("AMP"), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(filtered.total_items, 2);

    let err = app
        .services
        .images
        .list_images(&other, folder.id, None, PageRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let filter = app
        .services
        .images
        .get_image_by_name(&owner, folder.id, "filter.png")
        .await
        .unwrap();
    let renamed = app
        .services
        .images
        .rename_image(&owner, filter.id, "lowpass.png")
        .await
        .unwrap();
    assert_eq!(renamed.original_filename, "lowpass.png");
    assert_eq!(renamed.storage_path, filter.storage_path);

    let err = app
        .services
        .images
        .get_image_by_name(&owner, folder.id, "filter.png")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = app
        .services
        .images
        .rename_image(&owner, filter.id, "  ")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_delete_folder_cascades_and_second_delete_is_not_found() {
    let app = TestApp::new();
    let owner = app.create_test_user("alice", UserRole::User).await;
    let folder = app.user_folder(&owner, "mine", Space::UserPublic).await;
    let first = app.upload(&owner, &folder, "a.png").await;
    let second = app.upload(&owner, &folder, "b.png").await;

    app.services
        .folders
        .delete_folder(&owner, folder.id)
        .await
        .unwrap();

    for image in [&first, &second] {
        assert!(
            app.stores
                .graph
                .find_node(&image.storage_path)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            app.stores
                .annotations
                .find_by_image(image.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    let err = app
        .services
        .folders
        .delete_folder(&owner, folder.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_annotation_lifecycle() {
    let app = TestApp::new();
    let owner = app.create_test_user("alice", UserRole::User).await;
    let other = app.create_test_user("eve", UserRole::User).await;
    let folder = app.user_folder(&owner, "mine", Space::UserPrivate).await;
    let image = app.upload(&owner, &folder, "amp.png").await;

    let err = app
        .services
        .annotations
        .create_annotation(&owner, image.id, json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let annotation = app
        .services
        .annotations
        .get_annotation_by_image(&owner, image.id)
        .await
        .unwrap()
        .unwrap();

    let err = app
        .services
        .annotations
        .get_annotation_by_image(&other, image.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = app
        .services
        .annotations
        .update_annotation(&owner, annotation.id, json!(["not", "an", "object"]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let updated = app
        .services
        .annotations
        .update_annotation(&owner, annotation.id, json!({ "cpnts": [] }))
        .await
        .unwrap();
    assert_eq!(updated.content, json!({ "cpnts": [] }));

    let err = app
        .services
        .annotations
        .update_annotation(&owner, AnnotationId::new(), json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = app
        .services
        .annotations
        .delete_annotation(&other, annotation.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    app.services
        .annotations
        .delete_annotation(&owner, annotation.id)
        .await
        .unwrap();
    app.services
        .annotations
        .delete_annotation(&owner, annotation.id)
        .await
        .unwrap();

    let recreated = app
        .services
        .annotations
        .create_annotation(&owner, image.id, json!({ "fresh": true }))
        .await
        .unwrap();
    assert_eq!(recreated.image_id, image.id);
}

#[tokio::test]
async fn test_orphan_annotation_is_deleted_without_permission_check() {
    let app = TestApp::new();
    let stranger = app.create_test_user("eve", UserRole::User).await;

    let orphan = Annotation::new(ImageId::new(), json!({}), UserId::new());
    app.stores.annotations.create(&orphan).await.unwrap();

    app.services
        .annotations
        .delete_annotation(&stranger, orphan.id)
        .await
        .unwrap();
    assert!(
        app.stores
            .annotations
            .find_by_id(orphan.id)
            .await
            .unwrap()
            .is_none()
    );
}

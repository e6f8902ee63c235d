//! Organization management and its effect on folder access.

mod helpers;

use annograph_core::ErrorKind;
use annograph_entity::folder::Space;
use annograph_entity::organization::OrgRole;
use annograph_entity::user::UserRole;
use annograph_service::folder::CreateFolderRequest;
use annograph_service::organization::{
    CreateOrganizationRequest, InviteMemberRequest, UpdateOrganizationRequest,
};

use helpers::TestApp;

#[tokio::test]
async fn test_create_organization_rules() {
    let app = TestApp::new();
    let owner = app.create_test_user("bob", UserRole::User).await;
    let org = app.create_org(&owner, "lab").await;
    assert_eq!(Some(org.owner_id), owner.user.map(|u| u.id));

    let err = app
        .services
        .organizations
        .create_organization(
            &owner,
            CreateOrganizationRequest {
                name: "lab".to_string(),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = app
        .services
        .organizations
        .create_organization(
            &owner,
            CreateOrganizationRequest {
                name: "   ".to_string(),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let members = app
        .services
        .organizations
        .list_members(&owner, org.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].role, OrgRole::Admin);
}

#[tokio::test]
async fn test_membership_management() {
    let app = TestApp::new();
    let owner = app.create_test_user("bob", UserRole::User).await;
    let member = app.create_test_user("dave", UserRole::User).await;
    let outsider = app.create_test_user("carol", UserRole::User).await;
    let org = app.create_org(&owner, "lab").await;

    let err = app
        .services
        .organizations
        .invite_member(
            &owner,
            org.id,
            InviteMemberRequest {
                account: "nobody".to_string(),
                role: OrgRole::Member,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    app.add_member(&owner, &org, "dave", OrgRole::Member).await;

    let err = app
        .services
        .organizations
        .invite_member(
            &owner,
            org.id,
            InviteMemberRequest {
                account: "dave".to_string(),
                role: OrgRole::Admin,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = app
        .services
        .organizations
        .invite_member(
            &member,
            org.id,
            InviteMemberRequest {
                account: "carol".to_string(),
                role: OrgRole::Member,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let members = app
        .services
        .organizations
        .list_members(&member, org.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 2);

    let err = app
        .services
        .organizations
        .list_members(&outsider, org.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let owner_id = owner.user.unwrap().id;
    let err = app
        .services
        .organizations
        .remove_member(&owner, org.id, owner_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let shared = app
        .services
        .folders
        .create_folder(
            &owner,
            CreateFolderRequest {
                name: "shared".to_string(),
                space: Space::OrganizationPublic,
                organization_id: Some(org.id),
            },
        )
        .await
        .unwrap();
    app.services.folders.get_folder(&member, shared.id).await.unwrap();

    let member_id = member.user.unwrap().id;
    app.services
        .organizations
        .remove_member(&owner, org.id, member_id)
        .await
        .unwrap();

    let err = app
        .services
        .folders
        .get_folder(&member, shared.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = app
        .services
        .organizations
        .remove_member(&owner, org.id, member_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_update_and_delete_organization() {
    let app = TestApp::new();
    let owner = app.create_test_user("bob", UserRole::User).await;
    let co_admin = app.create_test_user("frank", UserRole::User).await;
    let member = app.create_test_user("dave", UserRole::User).await;
    let org = app.create_org(&owner, "lab").await;
    app.create_org(&owner, "other lab").await;
    app.add_member(&owner, &org, "frank", OrgRole::Admin).await;
    app.add_member(&owner, &org, "dave", OrgRole::Member).await;

    let err = app
        .services
        .organizations
        .update_organization(
            &member,
            org.id,
            UpdateOrganizationRequest {
                name: Some("mine now".to_string()),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = app
        .services
        .organizations
        .update_organization(
            &co_admin,
            org.id,
            UpdateOrganizationRequest {
                name: Some("other lab".to_string()),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let updated = app
        .services
        .organizations
        .update_organization(
            &co_admin,
            org.id,
            UpdateOrganizationRequest {
                name: None,
                description: Some("analog circuits".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "lab");
    assert_eq!(updated.description.as_deref(), Some("analog circuits"));

    let err = app
        .services
        .organizations
        .delete_organization(&co_admin, org.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    app.services
        .organizations
        .delete_organization(&owner, org.id)
        .await
        .unwrap();

    let err = app
        .services
        .organizations
        .list_members(&owner, org.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = app
        .services
        .folders
        .create_folder(
            &owner,
            CreateFolderRequest {
                name: "late".to_string(),
                space: Space::OrganizationPublic,
                organization_id: Some(org.id),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

//! Storage path layout.
//!
//! The storage path is both the file location and the graph node name,
//! so it is generated once at upload and never changes.

use uuid::Uuid;

use annograph_auth::permission::{Classification, classify};
use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_entity::folder::Folder;

/// Length of the random prefix that keeps same-named uploads apart.
const UNIQUE_PREFIX_LEN: usize = 8;

/// Relative storage path for a new upload into `folder`.
///
/// - platform folders: `public/<prefix>-<file>`
/// - organization folders: `organization/<orgId>/<prefix>-<file>`
/// - user folders: `user/<userId>/<prefix>-<file>`
pub fn storage_path_for(folder: &Folder, original_filename: &str) -> AppResult<String> {
    let file = file_name_only(original_filename);
    if file.is_empty() {
        return Err(AppError::validation("File name cannot be empty"));
    }
    let simple = Uuid::new_v4().simple().to_string();
    let prefix = &simple[..UNIQUE_PREFIX_LEN];

    Ok(match classify(folder)? {
        Classification::PlatformPublic => format!("public/{prefix}-{file}"),
        Classification::OrganizationPublic(org_id) => {
            format!("organization/{org_id}/{prefix}-{file}")
        }
        Classification::UserPublic(user_id) | Classification::UserPrivate(user_id) => {
            format!("user/{user_id}/{prefix}-{file}")
        }
    })
}

/// Strip any directory components a client sent along with the name.
fn file_name_only(name: &str) -> &str {
    name.rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(name)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use annograph_core::types::{OrganizationId, UserId};
    use annograph_entity::folder::{CreateFolder, Space};

    #[test]
    fn test_layout_per_space() {
        let public = Folder::from_create(CreateFolder::for_platform("p"));
        let path = storage_path_for(&public, "amp.png").unwrap();
        assert!(path.starts_with("public/"));
        assert!(path.ends_with("-amp.png"));
        assert_eq!(path.len(), "public/".len() + UNIQUE_PREFIX_LEN + "-amp.png".len());

        let org = OrganizationId::new();
        let shared = Folder::from_create(CreateFolder::for_organization("o", org));
        let path = storage_path_for(&shared, "amp.png").unwrap();
        assert!(path.starts_with(&format!("organization/{org}/")));

        let user = UserId::new();
        let mine = Folder::from_create(CreateFolder::for_user("u", Space::UserPrivate, user));
        let path = storage_path_for(&mine, "amp.png").unwrap();
        assert!(path.starts_with(&format!("user/{user}/")));
    }

    #[test]
    fn test_paths_are_unique_for_same_name() {
        let folder = Folder::from_create(CreateFolder::for_platform("p"));
        let a = storage_path_for(&folder, "x.png").unwrap();
        let b = storage_path_for(&folder, "x.png").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_directory_components_are_dropped() {
        assert_eq!(file_name_only("../../etc/passwd"), "passwd");
        assert_eq!(file_name_only("C:\\scans\\board.jpg"), "board.jpg");
        assert_eq!(file_name_only("plain.png"), "plain.png");
    }

    #[test]
    fn test_empty_name_rejected() {
        let folder = Folder::from_create(CreateFolder::for_platform("p"));
        assert!(storage_path_for(&folder, "scans/").is_err());
    }
}

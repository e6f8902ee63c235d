//! Folder, image, and annotation stores over [`MemoryStore`].

use async_trait::async_trait;
use chrono::Utc;

use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_core::types::{
    AnnotationId, FolderId, ImageId, OrganizationId, PageRequest, PageResponse, UserId,
};
use annograph_entity::annotation::Annotation;
use annograph_entity::folder::{Folder, MergeState, Space};
use annograph_entity::image::Image;

use super::MemoryStore;
use crate::store::{AnnotationStore, FolderStore, ImageStore};

fn newest_first(mut folders: Vec<Folder>) -> Vec<Folder> {
    folders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    folders
}

impl MemoryStore {
    /// Reject every pending merge into the organization.
    pub(super) fn reject_merges_into(&self, org_id: OrganizationId) -> u64 {
        let mut rejected = 0;
        for mut folder in self.folders.iter_mut() {
            if !folder.is_deleted
                && folder.is_merge_pending()
                && folder.target_organization_id == Some(org_id)
            {
                folder.merge_state = MergeState::Rejected;
                folder.updated_at = Utc::now();
                rejected += 1;
            }
        }
        rejected
    }
}

#[async_trait]
impl FolderStore for MemoryStore {
    async fn create(&self, folder: &Folder) -> AppResult<()> {
        self.folders.insert(folder.id, folder.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        Ok(self
            .folders
            .get(&id)
            .filter(|f| !f.is_deleted)
            .map(|f| f.clone()))
    }

    async fn list_all(&self) -> AppResult<Vec<Folder>> {
        Ok(newest_first(
            self.folders
                .iter()
                .filter(|f| !f.is_deleted)
                .map(|f| f.clone())
                .collect(),
        ))
    }

    async fn list_visible(
        &self,
        user_id: UserId,
        org_ids: &[OrganizationId],
    ) -> AppResult<Vec<Folder>> {
        let visible = self
            .folders
            .iter()
            .filter(|f| !f.is_deleted)
            .filter(|f| match f.space {
                Space::PlatformPublic => true,
                Space::UserPublic | Space::UserPrivate => f.owner_user_id == Some(user_id),
                Space::OrganizationPublic => f
                    .owner_organization_id
                    .is_some_and(|org| org_ids.contains(&org)),
            })
            .map(|f| f.clone())
            .collect();
        Ok(newest_first(visible))
    }

    async fn rename(&self, id: FolderId, name: &str) -> AppResult<Option<Folder>> {
        let Some(mut folder) = self.folders.get_mut(&id) else {
            return Ok(None);
        };
        if folder.is_deleted {
            return Ok(None);
        }
        folder.name = name.to_string();
        folder.updated_at = Utc::now();
        Ok(Some(folder.clone()))
    }

    async fn soft_delete(&self, id: FolderId) -> AppResult<bool> {
        let Some(mut folder) = self.folders.get_mut(&id) else {
            return Ok(false);
        };
        if folder.is_deleted {
            return Ok(false);
        }
        folder.is_deleted = true;
        folder.updated_at = Utc::now();
        Ok(true)
    }

    async fn request_merge(
        &self,
        id: FolderId,
        target: OrganizationId,
    ) -> AppResult<Option<Folder>> {
        let Some(mut folder) = self.folders.get_mut(&id) else {
            return Ok(None);
        };
        if folder.is_deleted
            || folder.space != Space::UserPublic
            || !folder.merge_state.accepts_request()
        {
            return Ok(None);
        }
        folder.merge_state = MergeState::Pending;
        folder.target_organization_id = Some(target);
        folder.updated_at = Utc::now();
        Ok(Some(folder.clone()))
    }

    async fn list_pending_merges(&self, org_id: OrganizationId) -> AppResult<Vec<Folder>> {
        let mut pending: Vec<Folder> = self
            .folders
            .iter()
            .filter(|f| {
                !f.is_deleted && f.is_merge_pending() && f.target_organization_id == Some(org_id)
            })
            .map(|f| f.clone())
            .collect();
        pending.sort_by_key(|f| f.updated_at);
        Ok(pending)
    }

    async fn approve_merge(&self, id: FolderId) -> AppResult<Option<Folder>> {
        let Some(mut folder) = self.folders.get_mut(&id) else {
            return Ok(None);
        };
        let target = match (folder.is_deleted, folder.merge_state, folder.target_organization_id) {
            (false, MergeState::Pending, Some(target)) => target,
            _ => return Ok(None),
        };
        folder.space = Space::OrganizationPublic;
        folder.owner_organization_id = Some(target);
        folder.owner_user_id = None;
        folder.merge_state = MergeState::Approved;
        folder.updated_at = Utc::now();
        Ok(Some(folder.clone()))
    }

    async fn reject_merge(&self, id: FolderId) -> AppResult<Option<Folder>> {
        let Some(mut folder) = self.folders.get_mut(&id) else {
            return Ok(None);
        };
        if folder.is_deleted || !folder.is_merge_pending() {
            return Ok(None);
        }
        folder.merge_state = MergeState::Rejected;
        folder.updated_at = Utc::now();
        Ok(Some(folder.clone()))
    }
}

#[async_trait]
impl ImageStore for MemoryStore {
    async fn create(&self, image: &Image) -> AppResult<()> {
        let taken = self
            .images
            .iter()
            .any(|i| i.storage_path == image.storage_path);
        if taken {
            return Err(AppError::conflict(format!(
                "Storage path '{}' is already registered",
                image.storage_path
            )));
        }
        self.images.insert(image.id, image.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ImageId) -> AppResult<Option<Image>> {
        Ok(self
            .images
            .get(&id)
            .filter(|i| !i.is_deleted)
            .map(|i| i.clone()))
    }

    async fn find_by_storage_path(&self, path: &str) -> AppResult<Option<Image>> {
        Ok(self
            .images
            .iter()
            .find(|i| !i.is_deleted && i.storage_path == path)
            .map(|i| i.clone()))
    }

    async fn find_by_filename(
        &self,
        folder_id: FolderId,
        filename: &str,
    ) -> AppResult<Option<Image>> {
        Ok(self
            .images
            .iter()
            .filter(|i| !i.is_deleted && i.folder_id == folder_id && i.original_filename == filename)
            .max_by_key(|i| i.created_at)
            .map(|i| i.clone()))
    }

    async fn list_by_folder(
        &self,
        folder_id: FolderId,
        keyword: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Image>> {
        let keyword = keyword
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty());
        let mut matching: Vec<Image> = self
            .images
            .iter()
            .filter(|i| !i.is_deleted && i.folder_id == folder_id)
            .filter(|i| {
                keyword
                    .as_ref()
                    .is_none_or(|k| i.original_filename.to_lowercase().contains(k.as_str()))
            })
            .map(|i| i.clone())
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn list_all_in_folder(&self, folder_id: FolderId) -> AppResult<Vec<Image>> {
        let mut images: Vec<Image> = self
            .images
            .iter()
            .filter(|i| !i.is_deleted && i.folder_id == folder_id)
            .map(|i| i.clone())
            .collect();
        images.sort_by_key(|i| i.created_at);
        Ok(images)
    }

    async fn list_deleted_in_folder(&self, folder_id: FolderId) -> AppResult<Vec<Image>> {
        let mut images: Vec<Image> = self
            .images
            .iter()
            .filter(|i| i.is_deleted && i.folder_id == folder_id)
            .map(|i| i.clone())
            .collect();
        images.sort_by_key(|i| i.created_at);
        Ok(images)
    }

    async fn rename(&self, id: ImageId, filename: &str) -> AppResult<Option<Image>> {
        let Some(mut image) = self.images.get_mut(&id) else {
            return Ok(None);
        };
        if image.is_deleted {
            return Ok(None);
        }
        image.original_filename = filename.to_string();
        Ok(Some(image.clone()))
    }

    async fn soft_delete_with_annotation(&self, id: ImageId) -> AppResult<bool> {
        {
            let Some(mut image) = self.images.get_mut(&id) else {
                return Ok(false);
            };
            if image.is_deleted {
                return Ok(false);
            }
            image.is_deleted = true;
        }
        self.annotations.retain(|_, a| a.image_id != id);
        Ok(true)
    }
}

#[async_trait]
impl AnnotationStore for MemoryStore {
    async fn create(&self, annotation: &Annotation) -> AppResult<()> {
        if self
            .annotations
            .iter()
            .any(|a| a.image_id == annotation.image_id)
        {
            return Err(AppError::conflict(format!(
                "Image {} already has an annotation",
                annotation.image_id
            )));
        }
        self.annotations.insert(annotation.id, annotation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: AnnotationId) -> AppResult<Option<Annotation>> {
        Ok(self.annotations.get(&id).map(|a| a.clone()))
    }

    async fn find_by_image(&self, image_id: ImageId) -> AppResult<Option<Annotation>> {
        Ok(self
            .annotations
            .iter()
            .find(|a| a.image_id == image_id)
            .map(|a| a.clone()))
    }

    async fn update_content(
        &self,
        id: AnnotationId,
        content: &serde_json::Value,
        editor: UserId,
    ) -> AppResult<Option<Annotation>> {
        let Some(mut annotation) = self.annotations.get_mut(&id) else {
            return Ok(None);
        };
        annotation.content = content.clone();
        annotation.last_editor_id = editor;
        annotation.updated_at = Utc::now();
        Ok(Some(annotation.clone()))
    }

    async fn delete(&self, id: AnnotationId) -> AppResult<bool> {
        Ok(self.annotations.remove(&id).is_some())
    }
}

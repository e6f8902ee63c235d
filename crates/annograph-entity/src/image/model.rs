//! Image entity model.

use annograph_core::types::{FolderId, ImageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An uploaded image.
///
/// `storage_path` is also the name of the image's graph node and never
/// changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Image {
    /// Unique image identifier.
    pub id: ImageId,
    /// Containing folder.
    pub folder_id: FolderId,
    /// Display filename; may be renamed.
    pub original_filename: String,
    /// Globally unique storage path and graph node name.
    pub storage_path: String,
    /// Pixel width, if known.
    pub width: Option<i32>,
    /// Pixel height, if known.
    pub height: Option<i32>,
    /// Size in bytes.
    pub file_size: i64,
    /// The user who uploaded the image.
    pub uploader_id: UserId,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// When the image was registered.
    pub created_at: DateTime<Utc>,
}

impl Image {
    /// Build a fresh image row.
    pub fn from_new(folder_id: FolderId, uploader_id: UserId, data: NewImage) -> Self {
        Self {
            id: ImageId::new(),
            folder_id,
            original_filename: data.original_filename,
            storage_path: data.storage_path,
            width: data.width,
            height: data.height,
            file_size: data.file_size,
            uploader_id,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    /// The name of the graph node derived from this image.
    pub fn node_name(&self) -> &str {
        &self.storage_path
    }
}

/// Metadata of a stored upload, handed over by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewImage {
    /// Display filename.
    pub original_filename: String,
    /// Path the bytes were stored under.
    pub storage_path: String,
    /// Pixel width, if known.
    pub width: Option<i32>,
    /// Pixel height, if known.
    pub height: Option<i32>,
    /// Size in bytes.
    pub file_size: i64,
}

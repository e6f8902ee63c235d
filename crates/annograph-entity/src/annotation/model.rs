//! Annotation entity model.

use annograph_core::types::{AnnotationId, ImageId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The JSON annotation document of an image. At most one per image.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Annotation {
    /// Unique annotation identifier.
    pub id: AnnotationId,
    /// Annotated image.
    pub image_id: ImageId,
    /// Annotation document.
    pub content: serde_json::Value,
    /// Last user to write the document.
    pub last_editor_id: UserId,
    /// When the document was last written.
    pub updated_at: DateTime<Utc>,
}

impl Annotation {
    /// Build a new annotation for an image.
    pub fn new(image_id: ImageId, content: serde_json::Value, editor: UserId) -> Self {
        Self {
            id: AnnotationId::new(),
            image_id,
            content,
            last_editor_id: editor,
            updated_at: Utc::now(),
        }
    }
}

//! Annotation documents attached to images.

pub mod service;

pub use service::AnnotationService;

use serde_json::Value;

use annograph_core::error::AppError;
use annograph_core::result::AppResult;

/// Annotation documents are JSON objects.
pub(crate) fn ensure_document(content: Value) -> AppResult<Value> {
    if content.is_object() {
        Ok(content)
    } else {
        Err(AppError::validation("Annotation content must be a JSON object"))
    }
}

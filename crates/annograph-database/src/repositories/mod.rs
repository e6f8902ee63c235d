//! sqlx implementations of the store traits.

pub mod annotation;
pub mod folder;
pub mod image;
pub mod organization;
pub mod user;

pub use annotation::AnnotationRepository;
pub use folder::FolderRepository;
pub use image::ImageRepository;
pub use organization::OrganizationRepository;
pub use user::UserRepository;

use annograph_core::error::{AppError, ErrorKind};

/// Map a sqlx error, turning a violation of `constraint` into a conflict.
pub(crate) fn map_unique(
    err: sqlx::Error,
    constraint: &str,
    conflict_message: impl FnOnce() -> String,
    context: &'static str,
) -> AppError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.constraint() == Some(constraint) => {
            AppError::conflict(conflict_message())
        }
        _ => AppError::with_source(ErrorKind::Database, context, err),
    }
}

/// Wrap a sqlx error as a database error with a fixed message.
pub(crate) fn db_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, context, e)
}

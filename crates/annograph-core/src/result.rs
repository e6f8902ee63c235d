//! Convenience result type alias for AnnoGraph.

use crate::error::AppError;

/// A specialized `Result` type for AnnoGraph operations.
pub type AppResult<T> = Result<T, AppError>;

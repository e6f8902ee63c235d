//! Folder-scoped permission checks.

pub mod classifier;
pub mod engine;
pub mod resolver;

pub use classifier::{Classification, classify};
pub use engine::PermissionEngine;
pub use resolver::{GraphResourceResolver, ResolvedNode};

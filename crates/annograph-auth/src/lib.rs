//! # annograph-auth
//!
//! Authorization for AnnoGraph. Every folder, image, annotation, and graph
//! operation is gated here:
//!
//! - `permission::classifier` maps a folder to its ownership class
//! - `permission::engine` decides READ/WRITE for a caller
//! - `permission::resolver` binds a graph node to its owning folder

pub mod permission;

pub use permission::{Classification, GraphResourceResolver, PermissionEngine, ResolvedNode};

//! # annograph-service
//!
//! Business logic service layer for AnnoGraph. Each service checks the
//! caller through the permission engine and then orchestrates the
//! relational and graph stores.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references. [`Services`] wires the full
//! set from a [`Stores`] bundle.

pub mod annotation;
pub mod context;
pub mod folder;
pub mod graph;
pub mod image;
pub mod organization;
pub mod services;

pub use annotation::AnnotationService;
pub use context::RequestContext;
pub use folder::{FolderService, MergeService, PendingMerge};
pub use graph::{NodeService, PermissionPropagator, PropagationSummary, RelationshipService};
pub use image::{ImageService, storage_path_for};
pub use organization::OrganizationService;
pub use services::{Services, Stores};

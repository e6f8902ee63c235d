//! Folder lifecycle and the merge-to-organization workflow.

pub mod merge;
pub mod service;

pub use merge::{MergeService, PendingMerge};
pub use service::{CopyFolderRequest, CreateFolderRequest, FolderService};

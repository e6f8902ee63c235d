//! Folder domain entities.

pub mod merge;
pub mod model;
pub mod space;

pub use merge::MergeState;
pub use model::{CreateFolder, Folder};
pub use space::Space;

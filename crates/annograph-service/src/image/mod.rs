//! Image registration, lookup and deletion.

pub mod path;
pub mod service;

pub use path::storage_path_for;
pub use service::{ImageService, RegisterImageRequest};

//! # annograph-database
//!
//! PostgreSQL connection management, the store traits the rest of
//! AnnoGraph programs against, their sqlx repositories, and an in-memory
//! implementation of every store used by tests and local tooling.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{
    AnnotationStore, FolderStore, ImageStore, MembershipStore, OrganizationStore, UserStore,
};

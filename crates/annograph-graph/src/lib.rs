//! # annograph-graph
//!
//! The graph half of AnnoGraph: circuit nodes keyed by image storage path
//! and typed relationships between them. The graph carries no access
//! control of its own; callers authorize through the owning folder first.

pub mod memory;
pub mod postgres;
pub mod store;
pub mod validation;

pub use memory::MemoryGraphStore;
pub use postgres::PgGraphStore;
pub use store::GraphStore;
pub use validation::validate_relationship_type;

//! # annograph-entity
//!
//! Domain entity models for AnnoGraph. Relational rows derive
//! `sqlx::FromRow`; graph values are plain serde types since the graph
//! store keeps them as JSON documents.

pub mod annotation;
pub mod folder;
pub mod graph;
pub mod image;
pub mod organization;
pub mod permission;
pub mod user;

//! Annotation domain entities.

pub mod model;

pub use model::Annotation;

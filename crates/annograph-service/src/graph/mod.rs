//! Graph node and relationship services, plus permission propagation.

pub mod node;
pub mod propagation;
pub mod relationship;

pub use node::{CreateNodeRequest, NodeService, UpdateNodeRequest};
pub use propagation::{PermissionPropagator, PropagationSummary};
pub use relationship::{CreateRelationshipRequest, RelationshipService, UpdateRelationshipRequest};

use annograph_core::error::AppError;
use annograph_core::result::AppResult;
use annograph_entity::graph::is_reserved_key;

/// Reject caller-supplied keys that only propagation may write.
pub(crate) fn reject_reserved_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> AppResult<()> {
    match keys.into_iter().find(|k| is_reserved_key(k)) {
        Some(key) => Err(AppError::validation(format!(
            "Property '{key}' is managed by the owning folder and cannot be set directly"
        ))),
        None => Ok(()),
    }
}

//! User domain entities.

pub mod model;
pub mod role;

pub use model::{AuthUser, User, UserProfile};
pub use role::UserRole;

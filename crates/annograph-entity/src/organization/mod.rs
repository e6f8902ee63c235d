//! Organization domain entities.

pub mod member;
pub mod model;
pub mod role;

pub use member::{MemberProfile, OrganizationMember};
pub use model::Organization;
pub use role::OrgRole;

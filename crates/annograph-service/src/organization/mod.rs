//! Organizations and their members.

pub mod service;

pub use service::{
    CreateOrganizationRequest, InviteMemberRequest, OrganizationService,
    UpdateOrganizationRequest,
};

//! Request context carrying the authenticated caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use annograph_core::result::AppResult;
use annograph_auth::PermissionEngine;
use annograph_entity::user::AuthUser;

/// Context for the current request.
///
/// Built at the boundary and passed into every service method so that
/// each operation knows *who* is acting. Authentication happens before
/// the context exists; an anonymous context carries no user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated caller, if any.
    pub user: Option<AuthUser>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context for the given caller.
    pub fn new(user: Option<AuthUser>) -> Self {
        Self {
            user,
            request_time: Utc::now(),
        }
    }

    /// A context with no logged-in user.
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    /// A context for a logged-in user.
    pub fn authenticated(user: AuthUser) -> Self {
        Self::new(Some(user))
    }

    /// The caller, if logged in.
    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// The caller, or `NotLoggedIn`.
    pub fn require_user(&self) -> AppResult<&AuthUser> {
        PermissionEngine::require_user(self.user())
    }

    /// Returns whether the caller is a platform admin.
    pub fn is_admin(&self) -> bool {
        self.user.is_some_and(|u| u.is_admin())
    }
}

//! Merge-to-organization state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a folder stands in the merge-to-organization workflow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "merge_state", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeState {
    /// No merge was ever requested.
    #[default]
    None,
    /// Waiting for an organization admin.
    Pending,
    /// Merged into the target organization.
    Approved,
    /// Declined; the owner may request again.
    Rejected,
}

impl MergeState {
    /// Whether a new merge request may be filed from this state.
    pub fn accepts_request(&self) -> bool {
        matches!(self, Self::None | Self::Rejected)
    }

    /// Whether an admin decision is outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Return the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for MergeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

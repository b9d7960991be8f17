//! Content lifecycle shared by posts and comments.
//!
//! Both entities start `active` and move freely between the three states;
//! who may drive a given transition is decided in [`crate::policy`]. This
//! module only answers what a state *means*.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lifecycle state of a post or comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Active,
    Inactive,
    Locked,
}

/// Every ordered pair of distinct states. All of them are mechanically legal.
pub const TRANSITIONS: [(ContentStatus, ContentStatus); 6] = [
    (ContentStatus::Active, ContentStatus::Inactive),
    (ContentStatus::Active, ContentStatus::Locked),
    (ContentStatus::Inactive, ContentStatus::Active),
    (ContentStatus::Inactive, ContentStatus::Locked),
    (ContentStatus::Locked, ContentStatus::Active),
    (ContentStatus::Locked, ContentStatus::Inactive),
];

impl ContentStatus {
    pub const ALL: [ContentStatus; 3] = [Self::Active, Self::Inactive, Self::Locked];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Locked => "locked",
        }
    }

    /// Whether moving from `self` to `to` is permitted by the state machine.
    /// Staying in the same state is a no-op and always permitted.
    pub fn can_transition_to(self, to: ContentStatus) -> bool {
        self == to || TRANSITIONS.contains(&(self, to))
    }

    /// Visible to viewers who are neither the owner nor an admin.
    pub fn is_publicly_visible(self) -> bool {
        !matches!(self, Self::Inactive)
    }

    /// Accepts new likes/dislikes.
    pub fn accepts_votes(self) -> bool {
        !matches!(self, Self::Locked)
    }

    /// A post in this state accepts new comments from ordinary viewers.
    pub fn accepts_comments(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Owner content edits are refused; status changes are still allowed.
    pub fn freezes_content(self) -> bool {
        matches!(self, Self::Locked)
    }

    /// Contributes to public aggregates such as `comments_count`.
    pub fn counts_publicly(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "locked" => Ok(Self::Locked),
            other => Err(DomainError::validation(format!(
                "Invalid status '{other}'. Must be one of: active, inactive, locked"
            ))),
        }
    }
}

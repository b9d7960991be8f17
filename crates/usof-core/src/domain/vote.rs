//! Likes and dislikes, and the rule that reconciles a resubmitted vote.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    #[default]
    Like,
    Dislike,
}

impl VoteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }

    /// Contribution to a net score.
    pub fn weight(self) -> i64 {
        match self {
            Self::Like => 1,
            Self::Dislike => -1,
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            _ => Err(DomainError::validation("Invalid like type")),
        }
    }
}

/// What a vote is cast on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteTarget {
    Post(i32),
    Comment(i32),
}

impl VoteTarget {
    pub fn id(self) -> i32 {
        match self {
            Self::Post(id) | Self::Comment(id) => id,
        }
    }

    /// Entity name used in client-facing messages.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Post(_) => "Post",
            Self::Comment(_) => "Comment",
        }
    }
}

/// A stored vote row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: i32,
    pub user_id: i32,
    pub kind: VoteKind,
    pub created_at: DateTime<Utc>,
}

/// Observable outcome of a vote submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Created,
    Updated,
    Removed,
}

/// Decide what a submission of `requested` does given the viewer's current
/// vote on the same target. Resubmitting the same kind toggles it off.
pub fn reconcile(existing: Option<VoteKind>, requested: VoteKind) -> VoteAction {
    match existing {
        None => VoteAction::Created,
        Some(kind) if kind == requested => VoteAction::Removed,
        Some(_) => VoteAction::Updated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_table() {
        use VoteKind::*;
        assert_eq!(reconcile(None, Like), VoteAction::Created);
        assert_eq!(reconcile(None, Dislike), VoteAction::Created);
        assert_eq!(reconcile(Some(Like), Like), VoteAction::Removed);
        assert_eq!(reconcile(Some(Dislike), Dislike), VoteAction::Removed);
        assert_eq!(reconcile(Some(Like), Dislike), VoteAction::Updated);
        assert_eq!(reconcile(Some(Dislike), Like), VoteAction::Updated);
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        assert_eq!("like".parse::<VoteKind>().unwrap(), VoteKind::Like);
        let err = "upvote".parse::<VoteKind>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_action_serializes_lowercase() {
        let json = serde_json::to_string(&VoteAction::Removed).unwrap();
        assert_eq!(json, "\"removed\"");
    }
}

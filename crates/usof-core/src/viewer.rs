//! The principal making a request.

use serde::Serialize;

use crate::domain::Role;
use crate::error::DomainError;

/// Who is asking. Resolved once per request and passed explicitly into every
/// policy and service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    Member { id: i32, role: Role },
}

/// An authenticated viewer, produced by [`Viewer::require_member`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: i32,
    pub role: Role,
}

impl Member {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl Viewer {
    pub fn member(id: i32, role: Role) -> Self {
        Self::Member { id, role }
    }

    pub fn id(&self) -> Option<i32> {
        match self {
            Self::Anonymous => None,
            Self::Member { id, .. } => Some(*id),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Member { role: Role::Admin, .. })
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Member { .. })
    }

    /// True when the viewer is the user identified by `owner_id`.
    pub fn owns(&self, owner_id: i32) -> bool {
        self.id() == Some(owner_id)
    }

    pub fn require_member(&self) -> Result<Member, DomainError> {
        match *self {
            Self::Anonymous => Err(DomainError::Unauthenticated(
                "Authentication required".to_string(),
            )),
            Self::Member { id, role } => Ok(Member { id, role }),
        }
    }
}

//! Authorization policy.
//!
//! Every function here is pure: callers load a snapshot of the target first,
//! ask for a [`Decision`], and only then act on it. Keeping I/O out of this
//! module lets the whole rule table be exercised without a database.

use tracing::debug;

use crate::domain::{CommentPatch, PostPatch, VoteTarget};
use crate::error::DomainError;
use crate::lifecycle::ContentStatus;
use crate::viewer::Viewer;

const AUTH_REQUIRED: &str = "Authentication required";
const PERMISSION_DENIED: &str = "Permission denied";
const ADMIN_REQUIRED: &str = "Admin privileges required";

/// Outcome of a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// The viewer is anonymous and must log in.
    DenyAuth,
    /// The viewer is known but not entitled.
    DenyForbidden(String),
    /// Pretend the target does not exist. `reason` only reaches the log.
    MaskNotFound {
        entity: &'static str,
        reason: &'static str,
    },
}

impl Decision {
    fn forbidden(msg: impl Into<String>) -> Self {
        Self::DenyForbidden(msg.into())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert into the error a service propagates with `?`.
    pub fn into_result(self) -> Result<(), DomainError> {
        match self {
            Self::Allow => Ok(()),
            Self::DenyAuth => Err(DomainError::Unauthenticated(AUTH_REQUIRED.to_string())),
            Self::DenyForbidden(msg) => Err(DomainError::Forbidden(msg)),
            Self::MaskNotFound { entity, reason } => {
                debug!(entity, reason, "Masking target as not found");
                Err(DomainError::not_found(entity))
            }
        }
    }
}

/// The part of a post or comment the policy needs to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentSnapshot {
    pub owner_id: i32,
    pub status: ContentStatus,
}

impl ContentSnapshot {
    pub fn new(owner_id: i32, status: ContentStatus) -> Self {
        Self { owner_id, status }
    }
}

fn privileged(viewer: &Viewer, owner_id: i32) -> bool {
    viewer.is_admin() || viewer.owns(owner_id)
}

/// Read access to a single post or comment.
///
/// Inactive content is only visible to its owner and to admins; locked
/// content stays visible to everyone.
pub fn read_content(viewer: &Viewer, entity: &'static str, target: ContentSnapshot) -> Decision {
    if target.status.is_publicly_visible() || privileged(viewer, target.owner_id) {
        Decision::Allow
    } else {
        Decision::MaskNotFound {
            entity,
            reason: "inactive content requested by non-owner",
        }
    }
}

pub fn read_post(viewer: &Viewer, post: ContentSnapshot) -> Decision {
    read_content(viewer, "Post", post)
}

pub fn read_comment(viewer: &Viewer, comment: ContentSnapshot) -> Decision {
    read_content(viewer, "Comment", comment)
}

pub fn require_authenticated(viewer: &Viewer) -> Decision {
    if viewer.is_authenticated() {
        Decision::Allow
    } else {
        Decision::DenyAuth
    }
}

pub fn require_admin(viewer: &Viewer) -> Decision {
    match viewer {
        Viewer::Anonymous => Decision::DenyAuth,
        v if v.is_admin() => Decision::Allow,
        _ => Decision::forbidden(ADMIN_REQUIRED),
    }
}

pub fn create_post(viewer: &Viewer) -> Decision {
    require_authenticated(viewer)
}

/// Owners and admins may update a post. A locked post refuses owner edits
/// to title, content and categories until it is unlocked; status changes go
/// through regardless.
pub fn update_post(viewer: &Viewer, post: ContentSnapshot, patch: &PostPatch) -> Decision {
    if !viewer.is_authenticated() {
        return Decision::DenyAuth;
    }
    let read = read_post(viewer, post);
    if !read.is_allowed() {
        return read;
    }
    if viewer.is_admin() {
        return Decision::Allow;
    }
    if !viewer.owns(post.owner_id) {
        return Decision::forbidden(PERMISSION_DENIED);
    }
    if patch.edits_content() && post.status.freezes_content() {
        return Decision::forbidden("This post is locked and cannot be edited");
    }
    Decision::Allow
}

fn delete_content(viewer: &Viewer, entity: &'static str, target: ContentSnapshot) -> Decision {
    if !viewer.is_authenticated() {
        return Decision::DenyAuth;
    }
    let read = read_content(viewer, entity, target);
    if !read.is_allowed() {
        return read;
    }
    if privileged(viewer, target.owner_id) {
        Decision::Allow
    } else {
        Decision::forbidden(PERMISSION_DENIED)
    }
}

pub fn delete_post(viewer: &Viewer, post: ContentSnapshot) -> Decision {
    delete_content(viewer, "Post", post)
}

pub fn delete_comment(viewer: &Viewer, comment: ContentSnapshot) -> Decision {
    delete_content(viewer, "Comment", comment)
}

/// Which comments of a readable post a viewer gets to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentVisibility {
    /// Every comment regardless of status.
    All,
    /// Non-inactive comments plus the given user's own inactive ones.
    VisibleTo(i32),
    /// Non-inactive comments only.
    Public,
}

impl CommentVisibility {
    pub fn admits(self, comment: ContentSnapshot) -> bool {
        match self {
            Self::All => true,
            Self::VisibleTo(uid) => {
                comment.status.is_publicly_visible() || comment.owner_id == uid
            }
            Self::Public => comment.status.is_publicly_visible(),
        }
    }
}

pub fn comment_visibility(viewer: &Viewer) -> CommentVisibility {
    match viewer {
        v if v.is_admin() => CommentVisibility::All,
        Viewer::Member { id, .. } => CommentVisibility::VisibleTo(*id),
        Viewer::Anonymous => CommentVisibility::Public,
    }
}

/// Comment creation on `post`. Inactive posts accept comments from their
/// owner and admins only; locked posts accept none.
pub fn create_comment(viewer: &Viewer, post: ContentSnapshot) -> Decision {
    if !viewer.is_authenticated() {
        return Decision::DenyAuth;
    }
    let read = read_post(viewer, post);
    if !read.is_allowed() {
        return read;
    }
    if post.status == ContentStatus::Locked {
        return Decision::forbidden("This post is locked and new comments cannot be added");
    }
    Decision::Allow
}

/// Owners edit content (unless the comment is locked) and status. Admins
/// who do not own the comment may only change its status.
pub fn update_comment(viewer: &Viewer, comment: ContentSnapshot, patch: &CommentPatch) -> Decision {
    if !viewer.is_authenticated() {
        return Decision::DenyAuth;
    }
    let read = read_comment(viewer, comment);
    if !read.is_allowed() {
        return read;
    }
    if viewer.owns(comment.owner_id) {
        if patch.content.is_some() && comment.status.freezes_content() {
            return Decision::forbidden("This comment is locked and cannot be edited");
        }
        return Decision::Allow;
    }
    if viewer.is_admin() {
        if patch.content.is_some() {
            return Decision::forbidden("Admins can only change comment status");
        }
        return Decision::Allow;
    }
    Decision::forbidden(PERMISSION_DENIED)
}

/// Voting on a post or comment. Locked targets refuse every vote; hidden
/// targets are masked.
pub fn vote(viewer: &Viewer, target: VoteTarget, snapshot: ContentSnapshot) -> Decision {
    if !viewer.is_authenticated() {
        return Decision::DenyAuth;
    }
    if !snapshot.status.accepts_votes() {
        let msg = match target {
            VoteTarget::Post(_) => "This post is locked and cannot be voted on",
            VoteTarget::Comment(_) => "This comment is locked and cannot be voted on",
        };
        return Decision::forbidden(msg);
    }
    read_content(viewer, target.entity(), snapshot)
}

/// Listing the votes of a target follows the target's read rule.
pub fn list_votes(viewer: &Viewer, target: VoteTarget, snapshot: ContentSnapshot) -> Decision {
    read_content(viewer, target.entity(), snapshot)
}

/// How much of a user profile the viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileAccess {
    Full,
    /// `email` and `email_confirmed` withheld.
    Redacted,
}

pub fn profile_access(viewer: &Viewer, subject_id: i32) -> ProfileAccess {
    if privileged(viewer, subject_id) {
        ProfileAccess::Full
    } else {
        ProfileAccess::Redacted
    }
}

/// Editing a user account: the subject themself or an admin. Role changes
/// are reserved for admins.
pub fn update_user(viewer: &Viewer, subject_id: i32, changes_role: bool) -> Decision {
    if !viewer.is_authenticated() {
        return Decision::DenyAuth;
    }
    if !privileged(viewer, subject_id) {
        return Decision::forbidden(PERMISSION_DENIED);
    }
    if changes_role && !viewer.is_admin() {
        return Decision::forbidden("Only admins can change roles");
    }
    Decision::Allow
}

/// Admin deletion of an account. Self-deletion is reported separately as a
/// validation failure by the caller.
pub fn delete_user(viewer: &Viewer) -> Decision {
    require_admin(viewer)
}

pub fn manage_categories(viewer: &Viewer) -> Decision {
    require_admin(viewer)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::ContentStatus;

/// Comment entity - an answer attached to a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub content: String,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i32,
    pub user_id: i32,
    pub content: String,
}

/// Requested changes to a comment.
#[derive(Debug, Clone, Default)]
pub struct CommentPatch {
    pub content: Option<String>,
    pub status: Option<ContentStatus>,
}

impl CommentPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.status.is_none()
    }

    pub fn apply(&self, comment: &mut Comment, now: DateTime<Utc>) {
        if let Some(content) = &self.content {
            comment.content = content.clone();
            comment.updated_at = now;
        }
        if let Some(status) = self.status {
            comment.status = status;
        }
    }
}

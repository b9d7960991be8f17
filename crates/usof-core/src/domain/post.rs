use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::ContentStatus;

/// Post entity - a question opened by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub content: String,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post about to be inserted. Status always starts `active`.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: i32,
    pub title: String,
    pub content: String,
    pub category_ids: Vec<i32>,
}

/// Requested changes to a post. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<ContentStatus>,
    pub category_ids: Option<Vec<i32>>,
}

impl PostPatch {
    /// Touches title, content or categories (anything besides status).
    pub fn edits_content(&self) -> bool {
        self.title.is_some() || self.content.is_some() || self.category_ids.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.edits_content() && self.status.is_none()
    }

    /// Apply the patch, refreshing `updated_at` only when content changed.
    pub fn apply(&self, post: &mut Post, now: DateTime<Utc>) {
        let mut touched = false;
        if let Some(title) = &self.title {
            post.title = title.clone();
            touched = true;
        }
        if let Some(content) = &self.content {
            post.content = content.clone();
            touched = true;
        }
        if self.category_ids.is_some() {
            touched = true;
        }
        if let Some(status) = self.status {
            post.status = status;
        }
        if touched {
            post.updated_at = now;
        }
    }
}

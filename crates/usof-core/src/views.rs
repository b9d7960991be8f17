//! Read projections assembled by the persistence layer.
//!
//! Counts are `i64` because that is what SQL aggregates produce.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Category, Role, VoteKind};
use crate::lifecycle::ContentStatus;
use crate::policy::{ContentSnapshot, ProfileAccess};
use crate::query::{PostSort, SortOrder};

/// One row of a post listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRow {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub content: String,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_login: String,
    pub author_name: String,
    pub likes_count: i64,
    pub dislikes_count: i64,
    /// Active comments only.
    pub comments_count: i64,
    pub author_rating: i64,
}

impl PostRow {
    pub fn net_score(&self) -> i64 {
        self.likes_count - self.dislikes_count
    }

    pub fn snapshot(&self) -> ContentSnapshot {
        ContentSnapshot::new(self.user_id, self.status)
    }
}

/// Order two rows by `sort`/`order`, breaking ties by ascending id.
pub fn compare_posts(a: &PostRow, b: &PostRow, sort: PostSort, order: SortOrder) -> Ordering {
    let primary = match sort {
        PostSort::Likes => a.net_score().cmp(&b.net_score()),
        PostSort::Date => a.created_at.cmp(&b.created_at),
    };
    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Post detail: the list row plus its categories.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostRow,
    pub categories: Vec<Category>,
}

/// A comment with its author and score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRow {
    pub id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub content: String,
    pub status: ContentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_login: String,
    pub author_name: String,
    pub author_profile_picture: Option<String>,
    pub post_title: String,
    pub likes_count: i64,
    pub dislikes_count: i64,
}

impl CommentRow {
    pub fn snapshot(&self) -> ContentSnapshot {
        ContentSnapshot::new(self.user_id, self.status)
    }
}

/// A user as shown to other users, with derived rating and activity counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub login: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_confirmed: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub rating: i64,
    /// Active posts only.
    pub posts_count: i64,
    /// Active comments only.
    pub comments_count: i64,
}

impl UserProfile {
    pub fn redact(mut self, access: ProfileAccess) -> Self {
        if access == ProfileAccess::Redacted {
            self.email = None;
            self.email_confirmed = None;
        }
        self
    }
}

/// A single like or dislike with the voter's login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteRow {
    pub id: i32,
    pub user_id: i32,
    #[serde(rename = "type")]
    pub kind: VoteKind,
    pub created_at: DateTime<Utc>,
    pub author_login: String,
}

/// A favorited post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FavoriteRow {
    #[serde(flatten)]
    pub post: PostRow,
    pub favorited_at: DateTime<Utc>,
}

/// Site-wide counters shown on the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumStats {
    pub total_posts: u64,
    pub total_users: u64,
    pub total_categories: u64,
}

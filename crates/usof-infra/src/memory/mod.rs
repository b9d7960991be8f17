//! In-memory store - used as fallback when no database is configured, and by
//! tests.
//!
//! Every table lives behind one async `RwLock`, so each repository call is
//! atomic. Unique indexes, foreign keys and cascades mirror the PostgreSQL
//! schema. Data is lost on process restart.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use usof_core::domain::{Category, Comment, Post, User, VoteKind, VoteTarget};
use usof_core::lifecycle::ContentStatus;
use usof_core::services::Repositories;
use usof_core::views::{CommentRow, PostRow, UserProfile};

mod repos;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone)]
struct VoteRecord {
    id: i32,
    user_id: i32,
    target_id: i32,
    kind: VoteKind,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct FavoriteRecord {
    id: i32,
    user_id: i32,
    post_id: i32,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Sequences {
    users: i32,
    posts: i32,
    comments: i32,
    categories: i32,
    post_votes: i32,
    comment_votes: i32,
    favorites: i32,
}

fn next(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    posts: BTreeMap<i32, Post>,
    comments: BTreeMap<i32, Comment>,
    categories: BTreeMap<i32, Category>,
    post_votes: Vec<VoteRecord>,
    comment_votes: Vec<VoteRecord>,
    /// (post_id, category_id)
    post_categories: Vec<(i32, i32)>,
    favorites: Vec<FavoriteRecord>,
    seq: Sequences,
}

impl Tables {
    fn votes(&self, target: VoteTarget) -> &Vec<VoteRecord> {
        match target {
            VoteTarget::Post(_) => &self.post_votes,
            VoteTarget::Comment(_) => &self.comment_votes,
        }
    }

    fn votes_mut(&mut self, target: VoteTarget) -> &mut Vec<VoteRecord> {
        match target {
            VoteTarget::Post(_) => &mut self.post_votes,
            VoteTarget::Comment(_) => &mut self.comment_votes,
        }
    }

    fn target_exists(&self, target: VoteTarget) -> bool {
        match target {
            VoteTarget::Post(id) => self.posts.contains_key(&id),
            VoteTarget::Comment(id) => self.comments.contains_key(&id),
        }
    }

    /// (likes, dislikes) on one target.
    fn tally(&self, target: VoteTarget) -> (i64, i64) {
        self.votes(target)
            .iter()
            .filter(|v| v.target_id == target.id())
            .fold((0, 0), |(l, d), v| match v.kind {
                VoteKind::Like => (l + 1, d),
                VoteKind::Dislike => (l, d + 1),
            })
    }

    /// Net score over every post and comment written by `user_id`,
    /// regardless of status.
    fn author_rating(&self, user_id: i32) -> i64 {
        let on_posts: i64 = self
            .post_votes
            .iter()
            .filter(|v| self.posts.get(&v.target_id).is_some_and(|p| p.user_id == user_id))
            .map(|v| v.kind.weight())
            .sum();
        let on_comments: i64 = self
            .comment_votes
            .iter()
            .filter(|v| {
                self.comments
                    .get(&v.target_id)
                    .is_some_and(|c| c.user_id == user_id)
            })
            .map(|v| v.kind.weight())
            .sum();
        on_posts + on_comments
    }

    fn post_row(&self, post: &Post) -> PostRow {
        let (likes, dislikes) = self.tally(VoteTarget::Post(post.id));
        let author = self.users.get(&post.user_id);
        PostRow {
            id: post.id,
            user_id: post.user_id,
            title: post.title.clone(),
            content: post.content.clone(),
            status: post.status,
            created_at: post.created_at,
            updated_at: post.updated_at,
            author_login: author.map(|u| u.login.clone()).unwrap_or_default(),
            author_name: author.map(|u| u.full_name.clone()).unwrap_or_default(),
            likes_count: likes,
            dislikes_count: dislikes,
            comments_count: self
                .comments
                .values()
                .filter(|c| c.post_id == post.id && c.status.counts_publicly())
                .count() as i64,
            author_rating: self.author_rating(post.user_id),
        }
    }

    fn comment_row(&self, comment: &Comment) -> CommentRow {
        let (likes, dislikes) = self.tally(VoteTarget::Comment(comment.id));
        let author = self.users.get(&comment.user_id);
        CommentRow {
            id: comment.id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            content: comment.content.clone(),
            status: comment.status,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            author_login: author.map(|u| u.login.clone()).unwrap_or_default(),
            author_name: author.map(|u| u.full_name.clone()).unwrap_or_default(),
            author_profile_picture: author.and_then(|u| u.profile_picture.clone()),
            post_title: self
                .posts
                .get(&comment.post_id)
                .map(|p| p.title.clone())
                .unwrap_or_default(),
            likes_count: likes,
            dislikes_count: dislikes,
        }
    }

    fn profile(&self, user: &User) -> UserProfile {
        UserProfile {
            id: user.id,
            login: user.login.clone(),
            full_name: user.full_name.clone(),
            email: Some(user.email.clone()),
            role: user.role,
            profile_picture: user.profile_picture.clone(),
            email_confirmed: Some(user.email_confirmed),
            created_at: user.created_at,
            rating: self.author_rating(user.id),
            posts_count: self
                .posts
                .values()
                .filter(|p| p.user_id == user.id && p.status == ContentStatus::Active)
                .count() as i64,
            comments_count: self
                .comments
                .values()
                .filter(|c| c.user_id == user.id && c.status == ContentStatus::Active)
                .count() as i64,
        }
    }

    fn remove_comment(&mut self, id: i32) -> bool {
        let removed = self.comments.remove(&id).is_some();
        self.comment_votes.retain(|v| v.target_id != id);
        removed
    }

    fn remove_post(&mut self, id: i32) -> bool {
        let removed = self.posts.remove(&id).is_some();
        let children: Vec<i32> = self
            .comments
            .values()
            .filter(|c| c.post_id == id)
            .map(|c| c.id)
            .collect();
        for comment_id in children {
            self.remove_comment(comment_id);
        }
        self.post_votes.retain(|v| v.target_id != id);
        self.post_categories.retain(|(post_id, _)| *post_id != id);
        self.favorites.retain(|f| f.post_id != id);
        removed
    }

    fn remove_user(&mut self, id: i32) -> bool {
        let removed = self.users.remove(&id).is_some();
        let posts: Vec<i32> = self
            .posts
            .values()
            .filter(|p| p.user_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in posts {
            self.remove_post(post_id);
        }
        let comments: Vec<i32> = self
            .comments
            .values()
            .filter(|c| c.user_id == id)
            .map(|c| c.id)
            .collect();
        for comment_id in comments {
            self.remove_comment(comment_id);
        }
        self.post_votes.retain(|v| v.user_id != id);
        self.comment_votes.retain(|v| v.user_id != id);
        self.favorites.retain(|f| f.user_id != id);
        removed
    }
}

/// Process-local implementation of every repository port.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the store as a full repository set.
    pub fn repositories(self: Arc<Self>) -> Repositories {
        Repositories {
            users: self.clone(),
            posts: self.clone(),
            comments: self.clone(),
            categories: self.clone(),
            votes: self.clone(),
            favorites: self,
        }
    }
}

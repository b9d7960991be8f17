use tracing::info;

use super::{Repositories, is_blank, or_not_found};
use crate::domain::{Category, Comment, NewComment, NewPost, Post, PostPatch};
use crate::error::{DomainError, RepoError};
use crate::policy::{self, ContentSnapshot};
use crate::query::{Page, PostListParams};
use crate::viewer::Viewer;
use crate::views::{CommentRow, ForumStats, PostDetail, PostRow};

#[derive(Debug, Clone, Default)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    pub categories: Vec<i32>,
}

#[derive(Clone)]
pub struct PostService {
    repos: Repositories,
}

impl PostService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn load(&self, id: i32) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post"))
    }

    /// Load a post and check the viewer may see it.
    async fn load_readable(&self, viewer: &Viewer, id: i32) -> Result<Post, DomainError> {
        let post = self.load(id).await?;
        policy::read_post(viewer, snapshot(&post)).into_result()?;
        Ok(post)
    }

    pub async fn list(
        &self,
        viewer: &Viewer,
        params: &PostListParams,
    ) -> Result<Page<PostRow>, DomainError> {
        let query = params.resolve(viewer)?;
        for &id in &query.categories {
            if self.repos.categories.find_by_id(id).await?.is_none() {
                return Err(DomainError::validation(UNKNOWN_CATEGORY));
            }
        }
        Ok(self.repos.posts.list(&query).await?)
    }

    pub async fn detail(&self, viewer: &Viewer, id: i32) -> Result<PostDetail, DomainError> {
        let row = self
            .repos
            .posts
            .row(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post"))?;
        policy::read_post(viewer, row.snapshot()).into_result()?;
        let categories = self.repos.posts.categories(id).await?;
        Ok(PostDetail {
            post: row,
            categories,
        })
    }

    pub async fn create(&self, viewer: &Viewer, input: CreatePostInput) -> Result<Post, DomainError> {
        policy::create_post(viewer).into_result()?;
        let member = viewer.require_member()?;
        if is_blank(&input.title) || is_blank(&input.content) {
            return Err(DomainError::validation("Title and content are required"));
        }
        let post = self
            .repos
            .posts
            .insert(NewPost {
                user_id: member.id,
                title: input.title,
                content: input.content,
                category_ids: distinct(input.categories),
            })
            .await
            .map_err(unknown_category)?;
        info!(post_id = post.id, user_id = member.id, "Post created");
        Ok(post)
    }

    pub async fn update(
        &self,
        viewer: &Viewer,
        id: i32,
        mut patch: PostPatch,
    ) -> Result<Post, DomainError> {
        viewer.require_member()?;
        patch.category_ids = patch.category_ids.map(distinct);
        let mut post = self.load(id).await?;
        policy::update_post(viewer, snapshot(&post), &patch).into_result()?;

        if patch.title.as_deref().is_some_and(is_blank) {
            return Err(DomainError::validation("Title cannot be empty"));
        }
        if patch.content.as_deref().is_some_and(is_blank) {
            return Err(DomainError::validation("Content cannot be empty"));
        }
        if patch.is_empty() {
            return Err(DomainError::validation("No valid fields to update"));
        }

        let from = post.status;
        patch.apply(&mut post, chrono::Utc::now());
        let post = self
            .repos
            .posts
            .update(&post, patch.category_ids.as_deref())
            .await
            .map_err(|e| match e {
                RepoError::Reference(_) => unknown_category(e),
                other => or_not_found(other, "Post"),
            })?;
        if from != post.status {
            info!(post_id = id, from = %from, to = %post.status, "Post status changed");
        }
        Ok(post)
    }

    pub async fn delete(&self, viewer: &Viewer, id: i32) -> Result<(), DomainError> {
        viewer.require_member()?;
        let post = self.load(id).await?;
        policy::delete_post(viewer, snapshot(&post)).into_result()?;
        self.repos
            .posts
            .delete(id)
            .await
            .map_err(|e| or_not_found(e, "Post"))?;
        info!(post_id = id, "Post deleted");
        Ok(())
    }

    pub async fn categories(&self, viewer: &Viewer, id: i32) -> Result<Vec<Category>, DomainError> {
        self.load_readable(viewer, id).await?;
        Ok(self.repos.posts.categories(id).await?)
    }

    /// Comments of a readable post, filtered by what the viewer may see.
    pub async fn comments(&self, viewer: &Viewer, id: i32) -> Result<Vec<CommentRow>, DomainError> {
        self.load_readable(viewer, id).await?;
        let visibility = policy::comment_visibility(viewer);
        Ok(self.repos.comments.list_for_post(id, visibility).await?)
    }

    pub async fn add_comment(
        &self,
        viewer: &Viewer,
        post_id: i32,
        content: String,
    ) -> Result<Comment, DomainError> {
        let member = viewer.require_member()?;
        if is_blank(&content) {
            return Err(DomainError::validation("Content is required"));
        }
        let post = self.load(post_id).await?;
        policy::create_comment(viewer, snapshot(&post)).into_result()?;

        let comment = self
            .repos
            .comments
            .insert(NewComment {
                post_id,
                user_id: member.id,
                content,
            })
            .await
            .map_err(|e| match e {
                RepoError::Reference(_) => DomainError::not_found("Post"),
                other => other.into(),
            })?;
        info!(comment_id = comment.id, post_id, user_id = member.id, "Comment created");
        Ok(comment)
    }

    pub async fn stats(&self) -> Result<ForumStats, DomainError> {
        Ok(ForumStats {
            total_posts: self.repos.posts.count_active().await?,
            total_users: self.repos.users.count().await?,
            total_categories: self.repos.categories.count().await?,
        })
    }
}

const UNKNOWN_CATEGORY: &str = "One or more categories do not exist";

fn unknown_category(err: RepoError) -> DomainError {
    match err {
        RepoError::Reference(_) => DomainError::validation(UNKNOWN_CATEGORY),
        other => other.into(),
    }
}

/// Each category links to a post at most once; first occurrence wins.
fn distinct(ids: Vec<i32>) -> Vec<i32> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

fn snapshot(post: &Post) -> ContentSnapshot {
    ContentSnapshot::new(post.user_id, post.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_keeps_first_occurrence() {
        assert_eq!(distinct(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(distinct(Vec::new()).is_empty());
    }
}

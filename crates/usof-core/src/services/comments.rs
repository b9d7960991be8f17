use std::sync::Arc;

use tracing::info;

use super::{is_blank, or_not_found};
use crate::domain::{Comment, CommentPatch};
use crate::error::DomainError;
use crate::policy::{self, ContentSnapshot};
use crate::ports::CommentRepository;
use crate::query::{Page, PageRequest};
use crate::viewer::Viewer;
use crate::views::CommentRow;

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>) -> Self {
        Self { comments }
    }

    async fn load(&self, id: i32) -> Result<Comment, DomainError> {
        self.comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment"))
    }

    pub async fn detail(&self, viewer: &Viewer, id: i32) -> Result<CommentRow, DomainError> {
        let row = self
            .comments
            .row(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment"))?;
        policy::read_comment(viewer, row.snapshot()).into_result()?;
        Ok(row)
    }

    /// Admin feed of every comment.
    pub async fn list_all(
        &self,
        viewer: &Viewer,
        page: PageRequest,
    ) -> Result<Page<CommentRow>, DomainError> {
        policy::require_admin(viewer).into_result()?;
        Ok(self.comments.list_all(page).await?)
    }

    pub async fn update(
        &self,
        viewer: &Viewer,
        id: i32,
        patch: CommentPatch,
    ) -> Result<Comment, DomainError> {
        viewer.require_member()?;
        let mut comment = self.load(id).await?;
        policy::update_comment(viewer, snapshot(&comment), &patch).into_result()?;

        if patch.content.as_deref().is_some_and(is_blank) {
            return Err(DomainError::validation("Content cannot be empty"));
        }
        if patch.is_empty() {
            return Err(DomainError::validation("No valid fields to update"));
        }

        let from = comment.status;
        patch.apply(&mut comment, chrono::Utc::now());
        let comment = self
            .comments
            .update(&comment)
            .await
            .map_err(|e| or_not_found(e, "Comment"))?;
        if from != comment.status {
            info!(comment_id = id, from = %from, to = %comment.status, "Comment status changed");
        }
        Ok(comment)
    }

    pub async fn delete(&self, viewer: &Viewer, id: i32) -> Result<(), DomainError> {
        viewer.require_member()?;
        let comment = self.load(id).await?;
        policy::delete_comment(viewer, snapshot(&comment)).into_result()?;
        self.comments
            .delete(id)
            .await
            .map_err(|e| or_not_found(e, "Comment"))?;
        info!(comment_id = id, "Comment deleted");
        Ok(())
    }
}

fn snapshot(comment: &Comment) -> ContentSnapshot {
    ContentSnapshot::new(comment.user_id, comment.status)
}

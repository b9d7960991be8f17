use std::sync::Arc;

use tracing::info;

use crate::error::{DomainError, RepoError};
use crate::ports::{FavoriteRepository, PostRepository};
use crate::query::{Page, PageRequest};
use crate::viewer::Viewer;
use crate::views::FavoriteRow;

/// The per-user favorites index.
#[derive(Clone)]
pub struct FavoriteService {
    favorites: Arc<dyn FavoriteRepository>,
    posts: Arc<dyn PostRepository>,
}

impl FavoriteService {
    pub fn new(favorites: Arc<dyn FavoriteRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { favorites, posts }
    }

    /// Favorite a post, whatever its status. A duplicate is a client error,
    /// including when two requests race on the unique index.
    pub async fn add(&self, viewer: &Viewer, post_id: i32) -> Result<(), DomainError> {
        let member = viewer.require_member()?;
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::not_found("Post"));
        }
        self.favorites
            .add(member.id, post_id)
            .await
            .map_err(|e| match e {
                RepoError::Constraint(_) => DomainError::validation("Post already in favorites"),
                RepoError::Reference(_) => DomainError::not_found("Post"),
                other => other.into(),
            })?;
        info!(user_id = member.id, post_id, "Post added to favorites");
        Ok(())
    }

    pub async fn remove(&self, viewer: &Viewer, post_id: i32) -> Result<(), DomainError> {
        let member = viewer.require_member()?;
        if !self.favorites.remove(member.id, post_id).await? {
            return Err(DomainError::not_found("Favorite"));
        }
        info!(user_id = member.id, post_id, "Post removed from favorites");
        Ok(())
    }

    pub async fn list(
        &self,
        viewer: &Viewer,
        page: PageRequest,
    ) -> Result<Page<FavoriteRow>, DomainError> {
        let member = viewer.require_member()?;
        Ok(self.favorites.list(member.id, page).await?)
    }

    /// Always `false` for anonymous viewers.
    pub async fn is_favorited(&self, viewer: &Viewer, post_id: i32) -> Result<bool, DomainError> {
        match viewer.id() {
            Some(user_id) => Ok(self.favorites.contains(user_id, post_id).await?),
            None => Ok(false),
        }
    }
}

use std::sync::Arc;

use tracing::info;

use super::{is_blank, or_not_found};
use crate::domain::{Category, CategoryPatch, NewCategory};
use crate::error::{DomainError, RepoError};
use crate::policy;
use crate::ports::{CategoryRepository, PostRepository};
use crate::query::{Page, PageRequest, PostListParams};
use crate::viewer::Viewer;
use crate::views::PostRow;

#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    posts: Arc<dyn PostRepository>,
}

fn title_conflict(err: RepoError) -> DomainError {
    match err {
        RepoError::Constraint(_) => DomainError::conflict("Category title already exists"),
        RepoError::NotFound => DomainError::not_found("Category"),
        other => other.into(),
    }
}

impl CategoryService {
    pub fn new(categories: Arc<dyn CategoryRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { categories, posts }
    }

    pub async fn list(&self, page: PageRequest) -> Result<Page<Category>, DomainError> {
        Ok(self.categories.list(page).await?)
    }

    pub async fn detail(&self, id: i32) -> Result<Category, DomainError> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Category"))
    }

    /// Posts tagged with the category, with the usual listing rules.
    pub async fn posts(
        &self,
        viewer: &Viewer,
        id: i32,
        params: &PostListParams,
    ) -> Result<Page<PostRow>, DomainError> {
        self.detail(id).await?;
        let mut query = params.resolve(viewer)?;
        query.categories = vec![id];
        Ok(self.posts.list(&query).await?)
    }

    pub async fn create(&self, viewer: &Viewer, input: NewCategory) -> Result<Category, DomainError> {
        policy::manage_categories(viewer).into_result()?;
        if is_blank(&input.title) {
            return Err(DomainError::validation("Title is required"));
        }
        let category = self.categories.insert(input).await.map_err(title_conflict)?;
        info!(category_id = category.id, title = %category.title, "Category created");
        Ok(category)
    }

    pub async fn update(
        &self,
        viewer: &Viewer,
        id: i32,
        patch: CategoryPatch,
    ) -> Result<Category, DomainError> {
        policy::manage_categories(viewer).into_result()?;
        let mut category = self.detail(id).await?;
        if let Some(title) = patch.title {
            if is_blank(&title) {
                return Err(DomainError::validation("Title cannot be empty"));
            }
            category.title = title;
        }
        if let Some(description) = patch.description {
            category.description = Some(description);
        }
        let category = self
            .categories
            .update(&category)
            .await
            .map_err(title_conflict)?;
        info!(category_id = id, "Category updated");
        Ok(category)
    }

    pub async fn delete(&self, viewer: &Viewer, id: i32) -> Result<(), DomainError> {
        policy::manage_categories(viewer).into_result()?;
        self.categories
            .delete(id)
            .await
            .map_err(|e| or_not_found(e, "Category"))?;
        info!(category_id = id, "Category deleted");
        Ok(())
    }
}

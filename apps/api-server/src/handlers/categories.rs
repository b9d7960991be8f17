//! Category endpoints. Writes are admin only.

use actix_web::{HttpResponse, web};
use serde_json::json;

use usof_core::domain::{CategoryPatch, NewCategory};
use usof_shared::ApiResponse;
use usof_shared::dto::CategoryRequest;

use super::ListQuery;
use crate::middleware::auth::CurrentViewer;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/categories
pub async fn list(state: web::Data<AppState>, query: ListQuery) -> AppResult<HttpResponse> {
    let page = state.services.categories.list(query.page()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({
        "categories": page.items,
        "pagination": page.pagination,
    }))))
}

/// GET /api/categories/{id}
pub async fn detail(state: web::Data<AppState>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    let category = state.services.categories.detail(*path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(category)))
}

/// GET /api/categories/{id}/posts
pub async fn posts(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
    query: ListQuery,
) -> AppResult<HttpResponse> {
    let page = state
        .services
        .categories
        .posts(&viewer, *path, &query.post_params())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({
        "posts": page.items,
        "pagination": page.pagination,
    }))))
}

/// POST /api/categories
pub async fn create(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    body: web::Json<CategoryRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let category = state
        .services
        .categories
        .create(
            &viewer,
            NewCategory {
                title: req.title.unwrap_or_default(),
                description: req.description,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        category,
        "Category created successfully",
    )))
}

/// PATCH /api/categories/{id}
pub async fn update(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
    body: web::Json<CategoryRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let category = state
        .services
        .categories
        .update(
            &viewer,
            *path,
            CategoryPatch {
                title: req.title,
                description: req.description,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        category,
        "Category updated successfully",
    )))
}

/// DELETE /api/categories/{id}
pub async fn delete(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.services.categories.delete(&viewer, *path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Category deleted successfully")))
}

//! The viewer's favorite posts.

use actix_web::{HttpResponse, web};
use serde_json::json;

use usof_shared::ApiResponse;

use super::ListQuery;
use crate::middleware::auth::CurrentViewer;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/favorites
pub async fn list(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    query: ListQuery,
) -> AppResult<HttpResponse> {
    let page = state.services.favorites.list(&viewer, query.page()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({
        "favorites": page.items,
        "pagination": page.pagination,
    }))))
}

/// POST /api/favorites/{post_id}
pub async fn add(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.services.favorites.add(&viewer, *path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Post added to favorites")))
}

/// DELETE /api/favorites/{post_id}
pub async fn remove(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.services.favorites.remove(&viewer, *path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Post removed from favorites")))
}

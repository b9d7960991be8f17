//! Comment endpoints. Creation lives under posts.

use actix_web::{HttpResponse, web};
use serde_json::json;

use usof_core::domain::{CommentPatch, VoteTarget};
use usof_core::lifecycle::ContentStatus;
use usof_shared::ApiResponse;
use usof_shared::dto::{UpdateCommentRequest, VoteRequest};

use super::{ListQuery, votes};
use crate::middleware::auth::CurrentViewer;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/comments - admin feed
pub async fn list_all(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    query: ListQuery,
) -> AppResult<HttpResponse> {
    let page = state.services.comments.list_all(&viewer, query.page()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({
        "comments": page.items,
        "pagination": page.pagination,
    }))))
}

/// GET /api/comments/{id}
pub async fn detail(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let comment = state.services.comments.detail(&viewer, *path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(comment)))
}

/// PATCH /api/comments/{id}
pub async fn update(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
    body: web::Json<UpdateCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let patch = CommentPatch {
        content: req.content,
        status: req
            .status
            .as_deref()
            .map(str::parse::<ContentStatus>)
            .transpose()?,
    };
    let comment = state.services.comments.update(&viewer, *path, patch).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        comment,
        "Comment updated successfully",
    )))
}

/// DELETE /api/comments/{id}
pub async fn delete(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.services.comments.delete(&viewer, *path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Comment deleted successfully")))
}

pub async fn likes(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    votes::list(&state, &viewer, VoteTarget::Comment(*path)).await
}

pub async fn vote(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
    body: Option<web::Json<VoteRequest>>,
) -> AppResult<HttpResponse> {
    votes::submit(&state, &viewer, VoteTarget::Comment(*path), body).await
}

pub async fn unvote(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    votes::remove(&state, &viewer, VoteTarget::Comment(*path)).await
}

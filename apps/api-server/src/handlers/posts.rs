//! Posts, their comments, categories and votes.

use actix_web::{HttpResponse, web};
use serde_json::json;

use usof_core::domain::{PostPatch, VoteTarget};
use usof_core::lifecycle::ContentStatus;
use usof_core::services::CreatePostInput;
use usof_shared::ApiResponse;
use usof_shared::dto::{
    CreateCommentRequest, CreatePostRequest, FavoriteStatusResponse, UpdatePostRequest,
    VoteRequest,
};

use super::{ListQuery, votes};
use crate::middleware::auth::CurrentViewer;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/posts
pub async fn list(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    query: ListQuery,
) -> AppResult<HttpResponse> {
    let page = state
        .services
        .posts
        .list(&viewer, &query.post_params())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({
        "posts": page.items,
        "pagination": page.pagination,
    }))))
}

/// GET /api/posts/{id}
pub async fn detail(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let post = state.services.posts.detail(&viewer, *path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let post = state
        .services
        .posts
        .create(
            &viewer,
            CreatePostInput {
                title: req.title,
                content: req.content,
                categories: req.categories,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        post,
        "Post created successfully",
    )))
}

/// PATCH /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let patch = PostPatch {
        title: req.title,
        content: req.content,
        status: req
            .status
            .as_deref()
            .map(str::parse::<ContentStatus>)
            .transpose()?,
        category_ids: req.categories,
    };
    let post = state.services.posts.update(&viewer, *path, patch).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        post,
        "Post updated successfully",
    )))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.services.posts.delete(&viewer, *path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Post deleted successfully")))
}

/// GET /api/posts/{id}/comments
pub async fn comments(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let comments = state.services.posts.comments(&viewer, *path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({ "comments": comments }))))
}

/// POST /api/posts/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let comment = state
        .services
        .posts
        .add_comment(&viewer, *path, body.into_inner().content)
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        comment,
        "Comment created successfully",
    )))
}

/// GET /api/posts/{id}/categories
pub async fn categories(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let categories = state.services.posts.categories(&viewer, *path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({ "categories": categories }))))
}

/// GET /api/posts/{id}/like
pub async fn likes(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    votes::list(&state, &viewer, VoteTarget::Post(*path)).await
}

/// POST /api/posts/{id}/like
pub async fn vote(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
    body: Option<web::Json<VoteRequest>>,
) -> AppResult<HttpResponse> {
    votes::submit(&state, &viewer, VoteTarget::Post(*path), body).await
}

/// DELETE /api/posts/{id}/like
pub async fn unvote(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    votes::remove(&state, &viewer, VoteTarget::Post(*path)).await
}

/// GET /api/posts/{id}/favorite-status
pub async fn favorite_status(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let is_favorited = state.services.favorites.is_favorited(&viewer, *path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(FavoriteStatusResponse { is_favorited })))
}

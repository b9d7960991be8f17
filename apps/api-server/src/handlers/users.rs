//! User management and profile pictures.

use std::path::Path;
use std::pin::pin;

use actix_multipart::Multipart;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, web};
use futures::{Stream, TryStreamExt};
use serde_json::json;

use usof_core::services::{CreateUserInput, UpdateUserInput};
use usof_shared::ApiResponse;
use usof_shared::dto::{CreateUserRequest, UpdateUserRequest, UserCountResponse};

use super::user_response;
use crate::middleware::auth::CurrentViewer;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Largest accepted profile picture.
const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

/// Form field carrying the image in a multipart upload.
const PICTURE_FIELD: &str = "profile_picture";

/// GET /api/users
pub async fn list(state: web::Data<AppState>, viewer: CurrentViewer) -> AppResult<HttpResponse> {
    let users = state.services.users.list(&viewer).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({ "users": users }))))
}

/// GET /api/users/count
pub async fn count(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let total_users = state.services.users.count().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(UserCountResponse { total_users })))
}

/// GET /api/users/{id}
pub async fn profile(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let profile = state.services.users.profile(&viewer, *path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(profile)))
}

/// POST /api/users - admin only
pub async fn create(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    body: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .services
        .users
        .create(
            &viewer,
            CreateUserInput {
                login: req.login,
                email: req.email,
                password: req.password,
                password_confirmation: req.confirm_password,
                full_name: req.full_name,
                role: req.role,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        user_response(user),
        "User created successfully",
    )))
}

/// PATCH /api/users/{id}
pub async fn update(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
    body: web::Json<UpdateUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let updated = state
        .services
        .users
        .update(
            &viewer,
            path.into_inner(),
            UpdateUserInput {
                login: req.login,
                full_name: req.full_name,
                email: req.email,
                password: req.password,
                password_confirmation: req.confirm_password,
                role: req.role,
                profile_picture: req.profile_picture,
            },
        )
        .await?;

    if let Some(old) = updated.replaced_picture {
        remove_picture(&state.uploads_dir, &old).await;
    }
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        user_response(updated.user),
        "User updated successfully",
    )))
}

/// PATCH /api/users/pfp - multipart form with a `profile_picture` file, or
/// a raw image body
pub async fn upload_picture(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    req: HttpRequest,
    payload: web::Payload,
) -> AppResult<HttpResponse> {
    viewer.require_member()?;

    let Picture { ext, bytes } = read_picture(&req, payload).await?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("No file uploaded".to_string()));
    }

    let filename = format!("pfp-{}.{ext}", uuid::Uuid::new_v4());
    tokio::fs::create_dir_all(&state.uploads_dir).await?;
    tokio::fs::write(state.uploads_dir.join(&filename), &bytes).await?;

    let previous = match state
        .services
        .users
        .set_profile_picture(&viewer, filename.clone())
        .await
    {
        Ok(previous) => previous,
        Err(e) => {
            remove_picture(&state.uploads_dir, &filename).await;
            return Err(e.into());
        }
    };
    if let Some(old) = previous {
        remove_picture(&state.uploads_dir, &old).await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        json!({ "profile_picture": filename }),
        "Profile picture updated successfully",
    )))
}

/// DELETE /api/users/{id} - admin only
pub async fn delete(
    state: web::Data<AppState>,
    viewer: CurrentViewer,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.services.users.delete(&viewer, *path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("User deleted successfully")))
}

struct Picture {
    ext: &'static str,
    bytes: Vec<u8>,
}

async fn read_picture(req: &HttpRequest, payload: web::Payload) -> AppResult<Picture> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !is_multipart(content_type) {
        let ext = picture_extension(content_type).ok_or_else(unsupported_type)?;
        let bytes = read_capped(payload).await?;
        return Ok(Picture { ext, bytes });
    }

    let mut form = pin!(Multipart::new(req.headers(), payload));
    while let Some(field) = form.try_next().await.map_err(malformed_upload)? {
        if field.name() != Some(PICTURE_FIELD) {
            continue;
        }
        let ext = field
            .content_type()
            .and_then(|mime| picture_extension(mime.essence_str()))
            .ok_or_else(unsupported_type)?;
        let bytes = read_capped(field).await?;
        return Ok(Picture { ext, bytes });
    }
    Err(AppError::BadRequest("No file uploaded".to_string()))
}

/// Collect an upload, refusing it as soon as it passes the size limit.
async fn read_capped<S, E>(stream: S) -> AppResult<Vec<u8>>
where
    S: Stream<Item = Result<web::Bytes, E>>,
    E: std::fmt::Display,
{
    let mut stream = pin!(stream);
    let mut bytes = Vec::new();
    while let Some(chunk) = stream.try_next().await.map_err(malformed_upload)? {
        if bytes.len() + chunk.len() > MAX_PICTURE_BYTES {
            return Err(AppError::PayloadTooLarge(
                "Profile picture must be at most 5 MB".to_string(),
            ));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn is_multipart(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("multipart/form-data"))
}

fn unsupported_type() -> AppError {
    AppError::BadRequest("Only JPEG, PNG and GIF images are allowed".to_string())
}

fn malformed_upload(err: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("Failed to read upload: {err}"))
}

fn picture_extension(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    match mime.as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Best effort: a stale file is only wasted disk.
async fn remove_picture(dir: &Path, name: &str) {
    if Path::new(name).file_name().and_then(|n| n.to_str()) != Some(name) {
        tracing::warn!(name, "Refusing to remove picture outside the uploads directory");
        return;
    }
    if let Err(e) = tokio::fs::remove_file(dir.join(name)).await {
        tracing::warn!(name, error = %e, "Failed to remove old profile picture");
    }
}

//! Authentication handlers.

use actix_web::{HttpResponse, web};

use usof_core::services::{
    EmailConfirmation, LoginInput, PASSWORD_RESET_NOTICE, PasswordResetInput, RegisterInput,
};
use usof_shared::ApiResponse;
use usof_shared::dto::{
    LoginRequest, PasswordResetConfirmRequest, PasswordResetRequest, RegisterRequest,
    RegisteredResponse, SessionUser,
};

use super::user_response;
use crate::middleware::auth::{CurrentViewer, SessionContext};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .services
        .identity
        .register(RegisterInput {
            login: req.login,
            email: req.email,
            password: req.password,
            password_confirmation: req.confirm_password,
            full_name: req.full_name,
        })
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        RegisteredResponse { user_id: user.id },
        "User registered successfully. Please check your email to confirm your account.",
    )))
}

/// GET /api/auth/confirm-email/{token}
pub async fn confirm_email(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let message = match state.services.identity.confirm_email(&path).await? {
        EmailConfirmation::Confirmed => "Email confirmed successfully",
        EmailConfirmation::AlreadyConfirmed => "Email already confirmed",
    };
    Ok(HttpResponse::Ok().json(ApiResponse::message(message)))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    session: SessionContext,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let user = state
        .services
        .identity
        .login(LoginInput {
            login: req.login,
            email: req.email,
            password: req.password,
        })
        .await?;

    session.persist_user(user.id)?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        SessionUser {
            id: user.id,
            login: user.login,
            full_name: user.full_name,
            role: user.role.as_str().to_string(),
        },
        "Login successful",
    )))
}

/// POST /api/auth/logout
pub async fn logout(session: SessionContext) -> AppResult<HttpResponse> {
    if session.user_id().is_none() {
        return Err(AppError::BadRequest("Not logged in".to_string()));
    }
    session.clear();
    Ok(HttpResponse::Ok().json(ApiResponse::message("Logged out successfully")))
}

/// POST /api/auth/password-reset
///
/// Answers identically whether or not the address is registered.
pub async fn request_password_reset(
    state: web::Data<AppState>,
    body: web::Json<PasswordResetRequest>,
) -> AppResult<HttpResponse> {
    state
        .services
        .identity
        .request_password_reset(&body.email)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message(PASSWORD_RESET_NOTICE)))
}

/// POST /api/auth/password-reset/{token}
pub async fn confirm_password_reset(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<PasswordResetConfirmRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    state
        .services
        .identity
        .confirm_password_reset(PasswordResetInput {
            token: path.into_inner(),
            password: req.password,
            password_confirmation: req.confirm_password,
        })
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message(
        "Password has been reset successfully",
    )))
}

/// GET /api/auth/me - Protected route
pub async fn me(state: web::Data<AppState>, viewer: CurrentViewer) -> AppResult<HttpResponse> {
    let user = state.services.identity.current_user(&viewer).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user_response(user))))
}

//! Like/dislike endpoints shared by posts and comments.

use actix_web::{HttpResponse, web};
use serde_json::json;

use usof_core::domain::{VoteAction, VoteKind, VoteTarget};
use usof_core::viewer::Viewer;
use usof_shared::ApiResponse;
use usof_shared::dto::{VoteRequest, VoteResponse};

use crate::middleware::error::AppResult;
use crate::state::AppState;

pub(super) async fn list(state: &AppState, viewer: &Viewer, target: VoteTarget) -> AppResult<HttpResponse> {
    let likes = state.services.votes.list(viewer, target).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({ "likes": likes }))))
}

/// A missing body or `type` counts as a like.
pub(super) async fn submit(
    state: &AppState,
    viewer: &Viewer,
    target: VoteTarget,
    body: Option<web::Json<VoteRequest>>,
) -> AppResult<HttpResponse> {
    let kind = match body.and_then(|b| b.into_inner().kind) {
        Some(raw) => raw.parse::<VoteKind>()?,
        None => VoteKind::Like,
    };
    let action = state.services.votes.vote_on(viewer, target, kind).await?;

    let message = match action {
        VoteAction::Created => format!("{} {} successfully", target.entity(), past_tense(kind)),
        VoteAction::Updated => format!("{} vote changed to {}", target.entity(), kind),
        VoteAction::Removed => format!("{} vote removed", target.entity()),
    };
    let response = ApiResponse::ok_with_message(
        VoteResponse {
            action: action_name(action).to_string(),
        },
        message,
    );
    Ok(match action {
        VoteAction::Created => HttpResponse::Created().json(response),
        VoteAction::Updated | VoteAction::Removed => HttpResponse::Ok().json(response),
    })
}

pub(super) async fn remove(state: &AppState, viewer: &Viewer, target: VoteTarget) -> AppResult<HttpResponse> {
    state.services.votes.unvote(viewer, target).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Like removed successfully")))
}

fn action_name(action: VoteAction) -> &'static str {
    match action {
        VoteAction::Created => "created",
        VoteAction::Updated => "updated",
        VoteAction::Removed => "removed",
    }
}

fn past_tense(kind: VoteKind) -> &'static str {
    match kind {
        VoteKind::Like => "liked",
        VoteKind::Dislike => "disliked",
    }
}

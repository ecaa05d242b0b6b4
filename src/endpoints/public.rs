//! Token-addressed routes for recipients. No authentication; the secret
//! token is the credential, and every lookup failure is the same 404.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::application::error::Result;
use crate::application::state::AppState;
use crate::schemas::{PublicFollowupView, PublicInviteView, SubmissionResponse};
use crate::services::gateway::find_followup;
use crate::services::invites::{AnswerDraft, FollowupAnswerDraft};

pub fn public_routes(state: AppState) -> Router {
    Router::new()
        .route("/{token}", get(view_invite).post(respond_to_invite))
        .route(
            "/{token}/followup/{followup_id}",
            get(view_followup).post(respond_to_followup),
        )
        .with_state(state)
}

async fn view_invite(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<PublicInviteView>> {
    let (invite, recipient) = state.invites.gateway().resolve_with_recipient(&token).await?;
    Ok(Json(PublicInviteView::new(&invite, &recipient)))
}

/// A resubmission against an answered invite renders the current state.
async fn respond_to_invite(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(draft): Json<AnswerDraft>,
) -> Result<Json<SubmissionResponse<PublicInviteView>>> {
    let submission = state.invites.respond(&token, &draft).await?;
    let recipient = state.invites.gateway().recipient_of(&submission.invite).await?;

    Ok(Json(SubmissionResponse {
        applied: submission.applied,
        invite: PublicInviteView::new(&submission.invite, &recipient),
    }))
}

async fn view_followup(
    State(state): State<AppState>,
    Path((token, followup_id)): Path<(String, String)>,
) -> Result<Json<PublicFollowupView>> {
    let (invite, recipient) = state.invites.gateway().resolve_with_recipient(&token).await?;
    let followup = find_followup(&invite, &followup_id)?.clone();

    Ok(Json(PublicFollowupView {
        invite: PublicInviteView::new(&invite, &recipient),
        followup,
    }))
}

async fn respond_to_followup(
    State(state): State<AppState>,
    Path((token, followup_id)): Path<(String, String)>,
    Json(draft): Json<FollowupAnswerDraft>,
) -> Result<Json<SubmissionResponse<PublicFollowupView>>> {
    let submission = state
        .invites
        .respond_to_followup(&token, &followup_id, &draft)
        .await?;
    let recipient = state.invites.gateway().recipient_of(&submission.invite).await?;
    let followup = find_followup(&submission.invite, &followup_id)?.clone();

    Ok(Json(SubmissionResponse {
        applied: submission.applied,
        invite: PublicFollowupView {
            invite: PublicInviteView::new(&submission.invite, &recipient),
            followup,
        },
    }))
}

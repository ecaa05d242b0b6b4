use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::application::error::{AppError, Result};
use crate::application::state::AppState;
use crate::middleware::AuthenticatedSender;
use crate::models::{invite, student};
use crate::schemas::{
    CreateInviteRequest, DashboardResponse, DashboardStats, FollowupRequestResponse,
    SenderInviteView,
};
use crate::services::invites::{FollowupDraft, InviteDraft};

/// Sender-facing invite routes (mounted behind `require_sender`)
pub fn invites_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_invites).post(create_invite))
        .route("/{invite_id}", get(get_invite).post(edit_invite))
        .route("/{invite_id}/edit", get(get_invite).post(edit_invite))
        .route(
            "/{invite_id}/followup",
            get(get_invite).post(request_followup),
        )
        .with_state(state)
}

/// Ids that are not numbers are simply unknown ids.
fn parse_invite_id(raw: &str) -> Result<i64> {
    raw.parse()
        .ok()
        .filter(|id: &i64| *id > 0)
        .ok_or_else(|| AppError::NotFound("Invite not found".to_string()))
}

fn sender_view(state: &AppState, invite: &invite::Model, recipient: &student::Model) -> SenderInviteView {
    SenderInviteView::new(
        invite,
        recipient,
        state.invites.followup_gate(invite),
        state.invites.followup_limit(),
    )
}

/// Dashboard: every invite the sender has sent, newest first
async fn list_invites(
    State(state): State<AppState>,
    Extension(AuthenticatedSender(sender)): Extension<AuthenticatedSender>,
) -> Result<Json<DashboardResponse>> {
    let rows = state.invites.list_for_sender(&sender).await?;

    let stats = DashboardStats::tally(rows.iter().map(|(invite, _)| &invite.status));
    let invites = rows
        .iter()
        .map(|(invite, recipient)| sender_view(&state, invite, recipient))
        .collect();

    Ok(Json(DashboardResponse { stats, invites }))
}

async fn create_invite(
    State(state): State<AppState>,
    Extension(AuthenticatedSender(sender)): Extension<AuthenticatedSender>,
    Json(request): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<SenderInviteView>)> {
    let created = state
        .invites
        .create(&sender, request.student_id, &request.content)
        .await?;
    let (invite, recipient) = state.invites.details(&sender, created.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(sender_view(&state, &invite, &recipient)),
    ))
}

async fn get_invite(
    State(state): State<AppState>,
    Extension(AuthenticatedSender(sender)): Extension<AuthenticatedSender>,
    Path(invite_id): Path<String>,
) -> Result<Json<SenderInviteView>> {
    let invite_id = parse_invite_id(&invite_id)?;
    let (invite, recipient) = state.invites.details(&sender, invite_id).await?;
    Ok(Json(sender_view(&state, &invite, &recipient)))
}

async fn edit_invite(
    State(state): State<AppState>,
    Extension(AuthenticatedSender(sender)): Extension<AuthenticatedSender>,
    Path(invite_id): Path<String>,
    Json(draft): Json<InviteDraft>,
) -> Result<Json<SenderInviteView>> {
    let invite_id = parse_invite_id(&invite_id)?;
    state.invites.edit(&sender, invite_id, &draft).await?;
    let (invite, recipient) = state.invites.details(&sender, invite_id).await?;
    Ok(Json(sender_view(&state, &invite, &recipient)))
}

async fn request_followup(
    State(state): State<AppState>,
    Extension(AuthenticatedSender(sender)): Extension<AuthenticatedSender>,
    Path(invite_id): Path<String>,
    Json(draft): Json<FollowupDraft>,
) -> Result<(StatusCode, Json<FollowupRequestResponse>)> {
    let invite_id = parse_invite_id(&invite_id)?;
    let followup = state
        .invites
        .request_followup(&sender, invite_id, &draft)
        .await?;
    let (invite, recipient) = state.invites.details(&sender, invite_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(FollowupRequestResponse {
            followup,
            invite: sender_view(&state, &invite, &recipient),
        }),
    ))
}

//! Sender authentication for the dashboard routes.
//!
//! Login lives elsewhere; this only verifies the bearer token it issued.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sea_orm::EntityTrait;

use crate::application::error::{AppError, Result};
use crate::application::state::AppState;
use crate::models::prelude::*;
use crate::models::user;

/// Sender resolved from the bearer token, available to handlers as an
/// `Extension`.
#[derive(Clone)]
pub struct AuthenticatedSender(pub user::Model);

pub async fn require_sender(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = bearer_token(&req).map(str::to_owned);
    let sender = match authenticate(&state, token.as_deref()).await {
        Ok(sender) => sender,
        Err(e) => return e.into_response(),
    };

    tracing::debug!(user_id = sender.id, "Sender authenticated");
    req.extensions_mut().insert(AuthenticatedSender(sender));

    next.run(req).await
}

async fn authenticate(state: &AppState, token: Option<&str>) -> Result<user::Model> {
    let token = token.ok_or_else(|| {
        AppError::Unauthorized("Missing or invalid Authorization header".to_string())
    })?;

    // Signature, expiry and issuer failures all surface as a 401 via `AppError::Jwt`.
    let claims = state.session_keys.decode_token(token)?;
    let sender_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))?;

    User::find_by_id(sender_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown sender".to_string()))
}

fn bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

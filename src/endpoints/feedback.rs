use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};

use crate::application::error::Result;
use crate::application::state::AppState;
use crate::middleware::AuthenticatedSender;
use crate::schemas::{FeedbackReceipt, FeedbackRequest};

/// Feedback box (mounted behind `require_sender`)
pub fn feedback_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(submit_feedback))
        .with_state(state)
}

async fn submit_feedback(
    State(state): State<AppState>,
    Extension(AuthenticatedSender(sender)): Extension<AuthenticatedSender>,
    Json(request): Json<FeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackReceipt>)> {
    let saved = state.feedback.submit(&sender, &request.message).await?;
    Ok((StatusCode::CREATED, Json(FeedbackReceipt::from(saved))))
}

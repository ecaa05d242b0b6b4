pub mod feedback;
pub mod invites;
pub mod public;
pub mod students;

use axum::{middleware as axum_middleware, Router};

use crate::application::state::AppState;
use crate::middleware::require_sender;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // Public routes (the secret token is the only credential)
    let public_routes = Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/i", public::public_routes(state.clone()));

    // Sender routes (bearer token required)
    let protected_routes = Router::new()
        .nest("/invites", invites::invites_routes(state.clone()))
        .nest("/api/students", students::students_routes(state.clone()))
        .nest("/feedback", feedback::feedback_routes(state.clone()))
        .layer(axum_middleware::from_fn_with_state(state, require_sender));

    public_routes.merge(protected_routes)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

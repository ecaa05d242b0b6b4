use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::application::error::Result;
use crate::application::state::AppState;
use crate::schemas::{CreateStudentRequest, StudentSearchQuery, StudentView};

/// Recipient lookup for the invite form (mounted behind `require_sender`)
pub fn students_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(search_students).post(create_student))
        .with_state(state)
}

async fn search_students(
    State(state): State<AppState>,
    Query(params): Query<StudentSearchQuery>,
) -> Result<Json<Vec<StudentView>>> {
    let students = state.students.search(&params.query).await?;
    Ok(Json(students.into_iter().map(StudentView::from).collect()))
}

/// Find-or-create by email; an existing recipient is returned as is.
async fn create_student(
    State(state): State<AppState>,
    Json(request): Json<CreateStudentRequest>,
) -> Result<Json<StudentView>> {
    let student = state
        .students
        .find_or_create(&request.name, &request.email)
        .await?;
    Ok(Json(StudentView::from(student)))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use super::error::error_response;
use crate::AppState;
use shared::NewMark;

pub async fn list_marks(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/students/{}/marks", student_id);

    match state.marks_service.get_marks_for_student(&student_id).await {
        Ok(marks) => (StatusCode::OK, Json(marks)).into_response(),
        Err(e) => error_response("list marks", e),
    }
}

pub async fn add_mark(
    State(state): State<AppState>,
    Json(request): Json<NewMark>,
) -> impl IntoResponse {
    info!("POST /api/marks - {} {}", request.student_id, request.subject);

    match state.marks_service.add_mark(request).await {
        Ok(mark) => (StatusCode::CREATED, Json(mark)).into_response(),
        Err(e) => error_response("add mark", e),
    }
}

pub async fn update_mark(
    State(state): State<AppState>,
    Path(mark_id): Path<String>,
    Json(request): Json<NewMark>,
) -> impl IntoResponse {
    info!("PUT /api/marks/{}", mark_id);

    match state.marks_service.update_mark(&mark_id, request).await {
        Ok(mark) => (StatusCode::OK, Json(mark)).into_response(),
        Err(e) => error_response("update mark", e),
    }
}

pub async fn delete_mark(
    State(state): State<AppState>,
    Path(mark_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/marks/{}", mark_id);

    match state.marks_service.delete_mark(&mark_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("delete mark", e),
    }
}

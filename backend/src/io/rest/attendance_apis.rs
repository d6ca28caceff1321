use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use super::error::error_response;
use crate::AppState;
use shared::NewAttendance;

/// Attendance for one student, most recent first
pub async fn list_attendance(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/students/{}/attendance", student_id);

    match state.attendance_service.get_attendance(&student_id).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => error_response("list attendance", e),
    }
}

pub async fn record_attendance(
    State(state): State<AppState>,
    Json(request): Json<NewAttendance>,
) -> impl IntoResponse {
    info!("POST /api/attendance - {} on {}", request.student_id, request.date);

    match state.attendance_service.record_attendance(request).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => error_response("record attendance", e),
    }
}

pub async fn update_attendance(
    State(state): State<AppState>,
    Path(attendance_id): Path<String>,
    Json(request): Json<NewAttendance>,
) -> impl IntoResponse {
    info!("PUT /api/attendance/{}", attendance_id);

    match state.attendance_service.update_attendance(&attendance_id, request).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_response("update attendance", e),
    }
}

pub async fn delete_attendance(
    State(state): State<AppState>,
    Path(attendance_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/attendance/{}", attendance_id);

    match state.attendance_service.delete_attendance(&attendance_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("delete attendance", e),
    }
}

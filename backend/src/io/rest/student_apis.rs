//! # REST API for Student Management
//!
//! Endpoints for creating, retrieving, updating and deleting students, plus
//! the one-off currency migration of legacy records.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use super::error::error_response;
use crate::AppState;
use shared::{CreateStudentRequest, ListQuery, UpdateStudentRequest};

/// Create a new student
pub async fn create_student(
    State(state): State<AppState>,
    Json(request): Json<CreateStudentRequest>,
) -> impl IntoResponse {
    info!("POST /api/students - {} {}", request.first_name, request.last_name);

    match state.student_service.create_student(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("create student", e),
    }
}

/// Get a student by ID
pub async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/students/{}", student_id);

    match state.student_service.require_student(&student_id).await {
        Ok(student) => (StatusCode::OK, Json(student)).into_response(),
        Err(e) => error_response("get student", e),
    }
}

/// List students, ordered by name
pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    info!("GET /api/students - {:?}", query);

    match state.student_service.list_students(query).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("list students", e),
    }
}

pub async fn update_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(request): Json<UpdateStudentRequest>,
) -> impl IntoResponse {
    info!("PUT /api/students/{}", student_id);

    match state.student_service.update_student(&student_id, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("update student", e),
    }
}

pub async fn delete_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/students/{}", student_id);

    match state.student_service.delete_student(&student_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("delete student", e),
    }
}

/// Upgrade every legacy student record to multi-currency billing
pub async fn migrate_currency(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/students/migrate-currency");

    match state.student_service.migrate_all_currencies().await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("migrate student currencies", e),
    }
}

//! Parent contact logs and student documents.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::info;

use super::error::error_response;
use crate::AppState;
use shared::{NewDocument, NewParentLog};

/// Body returned when a record is created and only its ID is known
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

pub async fn list_parent_logs(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/students/{}/parent-logs", student_id);

    match state.records_service.get_parent_logs(&student_id).await {
        Ok(logs) => (StatusCode::OK, Json(logs)).into_response(),
        Err(e) => error_response("list parent logs", e),
    }
}

pub async fn add_parent_log(
    State(state): State<AppState>,
    Json(request): Json<NewParentLog>,
) -> impl IntoResponse {
    info!("POST /api/parent-logs - {}", request.student_id);

    match state.records_service.add_parent_log(request).await {
        Ok(id) => (StatusCode::CREATED, Json(CreatedResponse { id })).into_response(),
        Err(e) => error_response("add parent log", e),
    }
}

pub async fn delete_parent_log(
    State(state): State<AppState>,
    Path(log_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/parent-logs/{}", log_id);

    match state.records_service.delete_parent_log(&log_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("delete parent log", e),
    }
}

pub async fn list_documents(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/students/{}/documents", student_id);

    match state.records_service.get_documents(&student_id).await {
        Ok(documents) => (StatusCode::OK, Json(documents)).into_response(),
        Err(e) => error_response("list documents", e),
    }
}

pub async fn add_document(
    State(state): State<AppState>,
    Json(request): Json<NewDocument>,
) -> impl IntoResponse {
    info!("POST /api/documents - {} '{}'", request.student_id, request.title);

    match state.records_service.add_document(request).await {
        Ok(id) => (StatusCode::CREATED, Json(CreatedResponse { id })).into_response(),
        Err(e) => error_response("add document", e),
    }
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/documents/{}", document_id);

    match state.records_service.delete_document(&document_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("delete document", e),
    }
}

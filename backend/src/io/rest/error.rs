//! Translation of service errors into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::domain::messaging::MessagingError;
use crate::domain::DomainError;
use crate::storage::StoreError;

/// JSON body of every error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Status code for an error raised by a service
pub fn status_for(e: &anyhow::Error) -> StatusCode {
    if let Some(store_error) = e.downcast_ref::<StoreError>() {
        return match store_error {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::UserNotFound(_) => StatusCode::UNAUTHORIZED,
        };
    }
    if e.downcast_ref::<DomainError>().is_some() {
        return StatusCode::BAD_REQUEST;
    }
    if e.downcast_ref::<MessagingError>().is_some() {
        return StatusCode::BAD_GATEWAY;
    }
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Log `e` against `action` and build the matching error response
pub fn error_response(action: &str, e: anyhow::Error) -> Response {
    let status = status_for(&e);
    if status.is_server_error() {
        error!("Failed to {}: {:#}", action, e);
    } else {
        warn!("Failed to {}: {}", action, e);
    }
    (status, Json(ErrorBody { error: e.to_string() })).into_response()
}

/// Plain 400 response for malformed input caught in the handler itself
pub fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

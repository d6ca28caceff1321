use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use super::error::{error_response, ErrorBody};
use crate::AppState;
use shared::LoginRequest;

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    info!("POST /api/auth/login - {}", request.email);

    match state.auth_service.login(request).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => error_response("sign in", e),
    }
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/auth/logout");

    match state.auth_service.logout().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("sign out", e),
    }
}

/// The signed-in user, or 401 when nobody is signed in
pub async fn me(State(state): State<AppState>) -> impl IntoResponse {
    match state.auth_service.current_user().await {
        Ok(Some(profile)) => (StatusCode::OK, Json(profile)).into_response(),
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody {
                error: "Not signed in".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response("load current user", e),
    }
}

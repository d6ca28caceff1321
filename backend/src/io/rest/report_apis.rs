use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use super::currency_apis::CurrencyParams;
use super::error::{bad_request, error_response};
use crate::AppState;

pub async fn student_summary(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/reports/students/{}", student_id);

    match state.report_service.student_summary(&student_id).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => error_response("build student summary", e),
    }
}

/// Outstanding balances converted into `?currency=` (default ZAR)
pub async fn billing_overview(
    State(state): State<AppState>,
    Query(params): Query<CurrencyParams>,
) -> impl IntoResponse {
    info!("GET /api/reports/billing - {:?}", params.currency);

    let currency = match params.parse() {
        Ok(currency) => currency,
        Err(message) => return bad_request(message),
    };
    match state.report_service.billing_overview(currency).await {
        Ok(overview) => (StatusCode::OK, Json(overview)).into_response(),
        Err(e) => error_response("build billing overview", e),
    }
}

//! # REST API for Parent Messaging
//!
//! Invoice and reminder delivery plus the WhatsApp webhook. A send that
//! reaches a provider but fails answers 502 with the `MessageResult`; a
//! parent with no usable contact answers 400.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{info, warn};

use super::error::error_response;
use crate::domain::messaging::webhook::{VerificationQuery, WebhookPayload};
use crate::AppState;
use shared::MessageResult;

fn message_response(result: MessageResult) -> Response {
    let status = match (result.success, result.platform) {
        (true, _) => StatusCode::OK,
        (false, None) => StatusCode::BAD_REQUEST,
        (false, Some(_)) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(result)).into_response()
}

pub async fn send_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/invoices/{}/send", invoice_id);

    match state.messaging_service.send_invoice(&invoice_id).await {
        Ok(result) => message_response(result),
        Err(e) => error_response("send invoice", e),
    }
}

pub async fn send_reminder(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> impl IntoResponse {
    info!("POST /api/invoices/{}/remind", invoice_id);

    match state.messaging_service.send_payment_reminder(&invoice_id).await {
        Ok(result) => message_response(result),
        Err(e) => error_response("send payment reminder", e),
    }
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/students/{}/messages", student_id);

    match state.messaging_service.message_history(&student_id).await {
        Ok(messages) => (StatusCode::OK, Json(messages)).into_response(),
        Err(e) => error_response("list messages", e),
    }
}

/// WhatsApp subscription handshake: echo `hub.challenge` as plain text
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(query): Query<VerificationQuery>,
) -> impl IntoResponse {
    info!("GET /api/messaging/webhook - mode {:?}", query.mode);

    match state.messaging_service.verify_webhook(&query) {
        Some(challenge) => (StatusCode::OK, challenge).into_response(),
        None => StatusCode::FORBIDDEN.into_response(),
    }
}

/// Delivery status notifications from WhatsApp
pub async fn receive_webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> impl IntoResponse {
    info!("POST /api/messaging/webhook - {} entries", payload.entry.len());

    match state.messaging_service.handle_webhook(&payload).await {
        Ok(outcome) => {
            if outcome.skipped > 0 {
                warn!("Webhook skipped {} status updates", outcome.skipped);
            }
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(e) => error_response("process webhook", e),
    }
}

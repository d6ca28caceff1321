//! # REST API for Invoices
//!
//! Generation, listing and status changes. Delivery to parents lives in
//! [`super::messaging_apis`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

use super::error::error_response;
use crate::AppState;
use shared::{GenerateInvoiceRequest, ListQuery, MarkOverdueResponse, UpdateInvoiceStatusRequest};

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListParams {
    pub student_id: Option<String>,
    pub after: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OverdueParams {
    /// Sweep as of this date instead of today
    pub as_of: Option<NaiveDate>,
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<InvoiceListParams>,
) -> impl IntoResponse {
    info!("GET /api/invoices - {:?}", params);

    let query = ListQuery {
        after: params.after,
        limit: params.limit,
    };
    match state
        .billing_service
        .list_invoices(params.student_id.as_deref(), query)
        .await
    {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("list invoices", e),
    }
}

/// Generate a draft invoice from billable attendance
pub async fn generate_invoice(
    State(state): State<AppState>,
    Json(request): Json<GenerateInvoiceRequest>,
) -> impl IntoResponse {
    info!("POST /api/invoices/generate - {:?}", request);

    match state.billing_service.generate_invoice(request).await {
        Ok(invoice) => (StatusCode::CREATED, Json(invoice)).into_response(),
        Err(e) => error_response("generate invoice", e),
    }
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/invoices/{}", invoice_id);

    match state.billing_service.require_invoice(&invoice_id).await {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => error_response("get invoice", e),
    }
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/invoices/{}", invoice_id);

    match state.billing_service.delete_invoice(&invoice_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("delete invoice", e),
    }
}

pub async fn update_invoice_status(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    Json(request): Json<UpdateInvoiceStatusRequest>,
) -> impl IntoResponse {
    info!("PUT /api/invoices/{}/status - {}", invoice_id, request.status);

    match state
        .billing_service
        .update_invoice_status(&invoice_id, request.status)
        .await
    {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => error_response("update invoice status", e),
    }
}

pub async fn mark_overdue(
    State(state): State<AppState>,
    Query(params): Query<OverdueParams>,
) -> impl IntoResponse {
    let today = params.as_of.unwrap_or_else(|| Utc::now().date_naive());
    info!("POST /api/invoices/mark-overdue - as of {}", today);

    match state.billing_service.mark_overdue_invoices(today).await {
        Ok(updated_invoice_ids) => {
            (StatusCode::OK, Json(MarkOverdueResponse { updated_invoice_ids })).into_response()
        }
        Err(e) => error_response("mark overdue invoices", e),
    }
}

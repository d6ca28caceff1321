//! Invoice generation and lifecycle.
//!
//! An invoice is priced from a student's billable attendance: hours are
//! summed per session type, multiplied by the student's rate in their
//! preferred currency and rounded half-to-even per line. After creation an
//! invoice only changes through status transitions:
//!
//! ```text
//! draft ──► sent ──► paid
//!   │        │        ▲
//!   │        ▼        │
//!   │     overdue ────┘
//!   └───────────────► paid
//! ```

use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::currency::{format_currency, rate_for, round_money, validate_currency_amount};
use crate::domain::errors::DomainError;
use crate::domain::pagination::paginate;
use crate::storage::{DataStore, StoreError};
use shared::{
    ExtraCharge, GenerateInvoiceRequest, Invoice, InvoiceLineItem, InvoiceStatus, ListQuery,
    ListResponse, NewInvoice, SessionType,
};

pub const PAYMENT_TERMS_DAYS: i64 = 14;

/// Whether an invoice may move from `from` to `to`
pub fn can_transition(from: InvoiceStatus, to: InvoiceStatus) -> bool {
    use InvoiceStatus::*;
    matches!(
        (from, to),
        (Draft, Sent) | (Draft, Paid) | (Sent, Paid) | (Sent, Overdue) | (Overdue, Paid)
    )
}

#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn DataStore>,
}

impl BillingService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Generate a draft invoice dated today
    pub async fn generate_invoice(&self, request: GenerateInvoiceRequest) -> Result<Invoice> {
        self.generate_invoice_on(request, Utc::now().date_naive()).await
    }

    /// Generate a draft invoice issued on `issue_date`
    pub async fn generate_invoice_on(
        &self,
        request: GenerateInvoiceRequest,
        issue_date: NaiveDate,
    ) -> Result<Invoice> {
        info!(
            "Generating invoice for {} ({:?} to {:?})",
            request.student_id, request.period_start, request.period_end
        );

        if let (Some(start), Some(end)) = (request.period_start, request.period_end) {
            if start > end {
                return Err(DomainError::validation("Period start must not be after period end").into());
            }
        }
        validate_extra_charges(&request.extra_charges)?;

        let student = self
            .store
            .get_student(&request.student_id)
            .await?
            .ok_or_else(|| StoreError::not_found("students", &request.student_id))?;
        let currency = student.billing_currency();

        let attendance = self.store.get_attendance(&student.id).await?;
        let mut totals: BTreeMap<SessionType, (u32, Decimal)> = BTreeMap::new();
        for record in attendance.iter().filter(|a| {
            a.status.is_billable()
                && request.period_start.map_or(true, |start| a.date >= start)
                && request.period_end.map_or(true, |end| a.date <= end)
        }) {
            let entry = totals.entry(record.session_type).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += record.duration_hours;
        }

        let line_items: Vec<InvoiceLineItem> = totals
            .into_iter()
            .map(|(session_type, (sessions, hours))| {
                let rate = rate_for(&student, session_type);
                InvoiceLineItem {
                    session_type,
                    sessions,
                    hours,
                    rate,
                    amount: round_money(rate * hours),
                }
            })
            .collect();

        if line_items.is_empty() && request.extra_charges.is_empty() {
            return Err(DomainError::validation("No billable sessions in the selected period").into());
        }

        let amount: Decimal = line_items.iter().map(|l| l.amount).sum::<Decimal>()
            + request.extra_charges.iter().map(|c| c.amount).sum::<Decimal>();

        let validation = validate_currency_amount(amount);
        if !validation.is_valid {
            return Err(DomainError::validation(format!(
                "Invoice total {} is not billable: {}",
                amount,
                validation.errors.join(", ")
            ))
            .into());
        }

        let new_invoice = NewInvoice {
            student_id: student.id.clone(),
            amount,
            currency,
            status: InvoiceStatus::Draft,
            line_items,
            extra_charges: request.extra_charges,
            period_start: request.period_start,
            period_end: request.period_end,
            issue_date,
            due_date: issue_date + Duration::days(PAYMENT_TERMS_DAYS),
        };

        let invoice_id = self.store.add_invoice(&new_invoice).await?;
        info!(
            "Created invoice {} for {}: {}",
            invoice_id,
            student.name,
            format_currency(amount, currency)
        );
        self.require_invoice(&invoice_id).await
    }

    /// Invoices newest first, optionally for one student
    pub async fn list_invoices(
        &self,
        student_id: Option<&str>,
        query: ListQuery,
    ) -> Result<ListResponse<Invoice>> {
        let mut invoices = self.store.get_invoices(student_id).await?;
        invoices.sort_by(|a, b| {
            b.issue_date
                .cmp(&a.issue_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(paginate(invoices, &query, |i| i.id.as_str()))
    }

    pub async fn get_invoice(&self, invoice_id: &str) -> Result<Option<Invoice>> {
        self.store.get_invoice(invoice_id).await
    }

    pub async fn require_invoice(&self, invoice_id: &str) -> Result<Invoice> {
        self.store
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| StoreError::not_found("invoices", invoice_id).into())
    }

    /// Move an invoice to `status`, enforcing the transition table
    pub async fn update_invoice_status(
        &self,
        invoice_id: &str,
        status: InvoiceStatus,
    ) -> Result<Invoice> {
        let mut invoice = self.require_invoice(invoice_id).await?;

        if !can_transition(invoice.status, status) {
            warn!(
                "Rejected invoice {} transition {} -> {}",
                invoice_id, invoice.status, status
            );
            return Err(DomainError::InvalidStatusTransition {
                from: invoice.status,
                to: status,
            }
            .into());
        }

        info!("Invoice {}: {} -> {}", invoice_id, invoice.status, status);
        invoice.status = status;
        invoice.updated_at = Utc::now();
        self.store.update_invoice(&invoice).await?;
        Ok(invoice)
    }

    pub async fn delete_invoice(&self, invoice_id: &str) -> Result<()> {
        info!("Deleting invoice: {}", invoice_id);
        self.store.delete_invoice(invoice_id).await
    }

    /// Mark every sent invoice whose due date has passed as overdue
    pub async fn mark_overdue_invoices(&self, today: NaiveDate) -> Result<Vec<String>> {
        let invoices = self.store.get_invoices(None).await?;
        let mut updated = Vec::new();

        for mut invoice in invoices
            .into_iter()
            .filter(|i| i.status == InvoiceStatus::Sent && i.due_date < today)
        {
            invoice.status = InvoiceStatus::Overdue;
            invoice.updated_at = Utc::now();
            self.store.update_invoice(&invoice).await?;
            updated.push(invoice.id);
        }

        info!("Marked {} invoices overdue as of {}", updated.len(), today);
        Ok(updated)
    }
}

fn validate_extra_charges(charges: &[ExtraCharge]) -> Result<()> {
    for charge in charges {
        if charge.description.trim().is_empty() {
            return Err(DomainError::validation("Charge description cannot be empty").into());
        }
        let validation = validate_currency_amount(charge.amount);
        if !validation.is_valid {
            return Err(DomainError::validation(format!(
                "Invalid charge '{}': {}",
                charge.description,
                validation.errors.join(", ")
            ))
            .into());
        }
    }
    Ok(())
}

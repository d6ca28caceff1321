//! Read-only aggregates over students, attendance, marks and invoices.

use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::currency::{convert_currency, round_money};
use crate::storage::{DataStore, StoreError};
use shared::{AttendanceStatus, BillingOverview, Currency, StudentSummary};

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn DataStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Attendance, marks and invoice totals for one student
    pub async fn student_summary(&self, student_id: &str) -> Result<StudentSummary> {
        let student = self
            .store
            .get_student(student_id)
            .await?
            .ok_or_else(|| StoreError::not_found("students", student_id))?;
        let currency = student.billing_currency();

        let attendance = self.store.get_attendance(student_id).await?;
        let mut attendance_by_status = BTreeMap::new();
        let mut billable_hours = BTreeMap::new();
        for record in &attendance {
            *attendance_by_status
                .entry(status_key(record.status).to_string())
                .or_insert(0u32) += 1;
            if record.status.is_billable() {
                *billable_hours
                    .entry(record.session_type)
                    .or_insert(Decimal::ZERO) += record.duration_hours;
            }
        }

        let marks = self.store.get_marks_for_student(student_id).await?;
        let average_mark = mean(marks.iter().map(|m| m.mark));
        let mut by_subject: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for mark in &marks {
            by_subject.entry(mark.subject.clone()).or_default().push(mark.mark);
        }
        let average_mark_by_subject = by_subject
            .into_iter()
            .filter_map(|(subject, values)| mean(values.into_iter()).map(|avg| (subject, avg)))
            .collect();

        // Invoices keep the currency they were issued in
        let mut invoice_totals = BTreeMap::new();
        for invoice in self.store.get_invoices(Some(student_id)).await? {
            *invoice_totals.entry(invoice.status).or_insert(Decimal::ZERO) +=
                convert_currency(invoice.amount, invoice.currency, currency);
        }

        debug!(
            "Summary for {}: {} sessions, {} marks",
            student.name,
            attendance.len(),
            marks.len()
        );

        Ok(StudentSummary {
            student_id: student.id,
            student_name: student.name,
            currency,
            attendance_by_status,
            billable_hours,
            average_mark,
            average_mark_by_subject,
            invoice_totals,
        })
    }

    /// Outstanding (sent or overdue) totals, per currency and converted
    pub async fn billing_overview(&self, reporting_currency: Currency) -> Result<BillingOverview> {
        let invoices = self.store.get_invoices(None).await?;

        let mut outstanding_by_currency: BTreeMap<Currency, Decimal> = BTreeMap::new();
        let mut outstanding_invoice_count = 0;
        for invoice in invoices.iter().filter(|i| i.status.is_outstanding()) {
            *outstanding_by_currency
                .entry(invoice.currency)
                .or_insert(Decimal::ZERO) += invoice.amount;
            outstanding_invoice_count += 1;
        }

        let outstanding_total = round_money(
            outstanding_by_currency
                .iter()
                .map(|(currency, amount)| convert_currency(*amount, *currency, reporting_currency))
                .sum(),
        );

        info!(
            "Billing overview: {} outstanding invoices, {} {}",
            outstanding_invoice_count, outstanding_total, reporting_currency
        );

        Ok(BillingOverview {
            reporting_currency,
            outstanding_by_currency,
            outstanding_total,
            outstanding_invoice_count,
        })
    }
}

fn status_key(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Present => "present",
        AttendanceStatus::Late => "late",
        AttendanceStatus::Absent => "absent",
        AttendanceStatus::Excused => "excused",
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / f64::from(count))
}

//! Billing lifecycle across services sharing one store.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use shared::{
    AttendanceStatus, Currency, ExtraCharge, GenerateInvoiceRequest, InvoiceStatus, NewAttendance,
    NewStudent, ParentContact, SessionRates, SessionType,
};
use tutor_backend::domain::{
    AttendanceService, BillingService, DomainError, ReportService, StudentService,
};
use tutor_backend::storage::{DataStore, MemoryStore};

struct Services {
    store: Arc<dyn DataStore>,
    students: StudentService,
    attendance: AttendanceService,
    billing: BillingService,
    reports: ReportService,
}

fn services() -> Services {
    let store: Arc<dyn DataStore> = Arc::new(MemoryStore::init_test());
    Services {
        students: StudentService::new(store.clone()),
        attendance: AttendanceService::new(store.clone()),
        billing: BillingService::new(store.clone()),
        reports: ReportService::new(store.clone()),
        store,
    }
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
}

async fn session(
    services: &Services,
    student_id: &str,
    day: u32,
    session_type: SessionType,
    hours: rust_decimal::Decimal,
    status: AttendanceStatus,
) {
    services
        .attendance
        .record_attendance(NewAttendance {
            student_id: student_id.to_string(),
            date: date(day),
            session_type,
            duration_hours: hours,
            status,
            notes: None,
        })
        .await
        .unwrap();
}

/// A record stored before billing currencies existed
async fn legacy_student(services: &Services) -> String {
    let mut rates = SessionRates::new();
    rates.insert(SessionType::Online, dec!(275));
    services
        .store
        .add_student(&NewStudent {
            first_name: "Kagiso".to_string(),
            last_name: "Molefe".to_string(),
            email: None,
            phone: None,
            grade: "8".to_string(),
            subjects: vec!["Mathematics".to_string()],
            parent_contact: ParentContact::default(),
            preferred_currency: None,
            rates,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_migrated_student_is_invoiced_in_rand() {
    let services = services();
    let student_id = legacy_student(&services).await;

    let migration = services.students.migrate_all_currencies().await.unwrap();
    assert_eq!(migration.migrated_count, 1);
    assert_eq!(migration.total_students, 1);

    let student = services.students.require_student(&student_id).await.unwrap();
    assert_eq!(student.preferred_currency, Some(Currency::Zar));
    assert_eq!(student.rates.get(&SessionType::Online), Some(&dec!(275)));
    assert_eq!(student.rates.get(&SessionType::InPersonOneOnOne), Some(&dec!(350)));

    // A second run finds nothing left to upgrade
    let again = services.students.migrate_all_currencies().await.unwrap();
    assert_eq!(again.migrated_count, 0);

    session(&services, &student_id, 5, SessionType::Online, dec!(1.5), AttendanceStatus::Present).await;
    session(&services, &student_id, 12, SessionType::InPersonOneOnOne, dec!(1), AttendanceStatus::Late).await;
    session(&services, &student_id, 19, SessionType::Online, dec!(1), AttendanceStatus::Absent).await;
    session(&services, &student_id, 26, SessionType::Online, dec!(1), AttendanceStatus::Excused).await;

    let invoice = services
        .billing
        .generate_invoice_on(
            GenerateInvoiceRequest {
                student_id: student_id.clone(),
                period_start: Some(date(1)),
                period_end: Some(date(31)),
                extra_charges: vec![ExtraCharge {
                    description: "Past paper pack".to_string(),
                    amount: dec!(45.50),
                }],
            },
            date(31),
        )
        .await
        .unwrap();

    assert_eq!(invoice.currency, Currency::Zar);
    assert_eq!(invoice.status, InvoiceStatus::Draft);
    assert_eq!(invoice.line_items.len(), 2);
    // 1.5h at 275 + 1h at 350 + 45.50
    assert_eq!(invoice.amount, dec!(808.00));
    assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2024, 9, 14).unwrap());
}

#[tokio::test]
async fn test_overdue_sweep_and_outstanding_report() {
    let services = services();
    let student_id = legacy_student(&services).await;
    services.students.migrate_all_currencies().await.unwrap();
    session(&services, &student_id, 5, SessionType::Online, dec!(2), AttendanceStatus::Present).await;

    let invoice = services
        .billing
        .generate_invoice_on(
            GenerateInvoiceRequest {
                student_id: student_id.clone(),
                period_start: None,
                period_end: None,
                extra_charges: vec![],
            },
            date(10),
        )
        .await
        .unwrap();
    assert_eq!(invoice.amount, dec!(550.00));

    // Drafts are never swept
    let swept = services.billing.mark_overdue_invoices(date(30)).await.unwrap();
    assert!(swept.is_empty());

    services
        .billing
        .update_invoice_status(&invoice.id, InvoiceStatus::Sent)
        .await
        .unwrap();

    // Due on the 24th: not overdue on the day itself
    assert!(services.billing.mark_overdue_invoices(date(24)).await.unwrap().is_empty());
    let swept = services.billing.mark_overdue_invoices(date(25)).await.unwrap();
    assert_eq!(swept, vec![invoice.id.clone()]);

    let overview = services.reports.billing_overview(Currency::Usd).await.unwrap();
    assert_eq!(overview.outstanding_invoice_count, 1);
    assert_eq!(overview.outstanding_by_currency.get(&Currency::Zar), Some(&dec!(550.00)));
    // 550 / 18.50
    assert_eq!(overview.outstanding_total, dec!(29.73));

    let summary = services.reports.student_summary(&student_id).await.unwrap();
    assert_eq!(summary.invoice_totals.get(&InvoiceStatus::Overdue), Some(&dec!(550.00)));
    assert_eq!(summary.billable_hours.get(&SessionType::Online), Some(&dec!(2)));

    // Overdue can only move on to paid
    let err = services
        .billing
        .update_invoice_status(&invoice.id, InvoiceStatus::Sent)
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<DomainError>(),
        Some(&DomainError::InvalidStatusTransition {
            from: InvoiceStatus::Overdue,
            to: InvoiceStatus::Sent,
        })
    );

    services
        .billing
        .update_invoice_status(&invoice.id, InvoiceStatus::Paid)
        .await
        .unwrap();
    let overview = services.reports.billing_overview(Currency::Zar).await.unwrap();
    assert_eq!(overview.outstanding_invoice_count, 0);
    assert_eq!(overview.outstanding_total, dec!(0));
}

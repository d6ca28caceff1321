//! # Domain Module
//!
//! Business rules for the tutoring practice. Services are cheap to clone and
//! share one injected `Arc<dyn DataStore>`; they validate input, apply the
//! rules below and hand plain records back to the IO layer.
//!
//! ## Services
//!
//! - [`StudentService`]: student records, default rates, currency migration
//! - [`AttendanceService`] and [`MarksService`]: session and grade records
//! - [`RecordsService`]: parent contact logs and documents
//! - [`BillingService`]: invoice generation and status lifecycle
//! - [`ReportService`]: per-student summaries and outstanding balances
//! - [`MessagingService`]: WhatsApp / WeChat delivery of invoices and reminders
//! - [`AuthService`]: sign-in against the store's auth provider
//!
//! Money is always `rust_decimal::Decimal`; see [`currency`] for conversion,
//! rounding and formatting rules.

pub mod attendance_service;
pub mod auth_service;
pub mod billing_service;
pub mod currency;
pub mod errors;
pub mod marks_service;
pub mod messaging;
pub mod pagination;
pub mod records_service;
pub mod report_service;
pub mod student_service;

pub use attendance_service::AttendanceService;
pub use auth_service::AuthService;
pub use billing_service::BillingService;
pub use errors::DomainError;
pub use marks_service::MarksService;
pub use messaging::MessagingService;
pub use records_service::RecordsService;
pub use report_service::ReportService;
pub use student_service::StudentService;

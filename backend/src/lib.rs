//! # Tutor Backend
//!
//! Non-UI logic for the tutoring practice: student records, attendance,
//! marks, multi-currency invoicing, reports and parent messaging.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (axum REST handlers)
//!     ↓
//! Domain Layer (services, currency rules, messaging clients)
//!     ↓
//! Storage Layer (DataStore traits, in-memory store)
//! ```
//!
//! [`initialize_backend`] wires the services onto one shared store and
//! [`create_router`] mounts every endpoint under `/api`.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::AppConfig;
use domain::{
    AttendanceService, AuthService, BillingService, MarksService, MessagingService,
    RecordsService, ReportService, StudentService,
};
use storage::{DataStore, MemoryStore};

/// Services shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub student_service: StudentService,
    pub attendance_service: AttendanceService,
    pub marks_service: MarksService,
    pub records_service: RecordsService,
    pub billing_service: BillingService,
    pub report_service: ReportService,
    pub messaging_service: MessagingService,
    pub auth_service: AuthService,
}

impl AppState {
    /// Wire all services onto `store`
    pub fn new(store: Arc<dyn DataStore>, config: &AppConfig) -> Result<Self> {
        Ok(Self {
            student_service: StudentService::new(store.clone()),
            attendance_service: AttendanceService::new(store.clone()),
            marks_service: MarksService::new(store.clone()),
            records_service: RecordsService::new(store.clone()),
            billing_service: BillingService::new(store.clone()),
            report_service: ReportService::new(store.clone()),
            messaging_service: MessagingService::new(store.clone(), &config.messaging)?,
            auth_service: AuthService::new(store),
        })
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up data store");
    let store = if config.sample_data {
        MemoryStore::with_sample_data(config.mock_latency()).await?
    } else {
        MemoryStore::new(config.mock_latency())
    };

    info!("Setting up domain services");
    AppState::new(Arc::new(store), config)
}

/// Create the axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, allowing any origin", cors_origin);
            cors.allow_origin(Any)
        }
    };

    Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

fn api_routes() -> Router<AppState> {
    use io::rest::*;

    Router::new()
        // Auth
        .route("/auth/login", post(auth_apis::login))
        .route("/auth/logout", post(auth_apis::logout))
        .route("/auth/me", get(auth_apis::me))
        // Students
        .route("/students", get(student_apis::list_students).post(student_apis::create_student))
        .route("/students/migrate-currency", post(student_apis::migrate_currency))
        .route(
            "/students/:id",
            get(student_apis::get_student)
                .put(student_apis::update_student)
                .delete(student_apis::delete_student),
        )
        .route("/students/:id/attendance", get(attendance_apis::list_attendance))
        .route("/students/:id/marks", get(marks_apis::list_marks))
        .route("/students/:id/parent-logs", get(record_apis::list_parent_logs))
        .route("/students/:id/documents", get(record_apis::list_documents))
        .route("/students/:id/messages", get(messaging_apis::list_messages))
        // Attendance and marks
        .route("/attendance", post(attendance_apis::record_attendance))
        .route(
            "/attendance/:id",
            put(attendance_apis::update_attendance).delete(attendance_apis::delete_attendance),
        )
        .route("/marks", post(marks_apis::add_mark))
        .route("/marks/:id", put(marks_apis::update_mark).delete(marks_apis::delete_mark))
        // Parent logs and documents
        .route("/parent-logs", post(record_apis::add_parent_log))
        .route("/parent-logs/:id", axum::routing::delete(record_apis::delete_parent_log))
        .route("/documents", post(record_apis::add_document))
        .route("/documents/:id", axum::routing::delete(record_apis::delete_document))
        // Invoices
        .route("/invoices", get(invoice_apis::list_invoices))
        .route("/invoices/generate", post(invoice_apis::generate_invoice))
        .route("/invoices/mark-overdue", post(invoice_apis::mark_overdue))
        .route(
            "/invoices/:id",
            get(invoice_apis::get_invoice).delete(invoice_apis::delete_invoice),
        )
        .route("/invoices/:id/status", put(invoice_apis::update_invoice_status))
        .route("/invoices/:id/send", post(messaging_apis::send_invoice))
        .route("/invoices/:id/remind", post(messaging_apis::send_reminder))
        // Messaging
        .route(
            "/messaging/webhook",
            get(messaging_apis::verify_webhook).post(messaging_apis::receive_webhook),
        )
        // Currency
        .route("/currency/rates", get(currency_apis::get_rates))
        .route("/currency/convert", post(currency_apis::convert))
        .route("/currency/validate", post(currency_apis::validate_amount))
        // Reports
        .route("/reports/students/:id", get(report_apis::student_summary))
        .route("/reports/billing", get(report_apis::billing_overview))
}

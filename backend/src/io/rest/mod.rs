//! # REST API
//!
//! axum handlers for every `/api` endpoint, grouped by resource. Failures
//! are mapped to status codes in [`error`]: unknown records give 404, rule
//! violations 400, failed sign-in 401, provider failures 502.

pub mod attendance_apis;
pub mod auth_apis;
pub mod currency_apis;
pub mod error;
pub mod invoice_apis;
pub mod marks_apis;
pub mod messaging_apis;
pub mod record_apis;
pub mod report_apis;
pub mod student_apis;

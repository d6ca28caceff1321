//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer. The
//! in-memory [`MemoryStore`](super::MemoryStore) satisfies the same contract a
//! hosted document store would.
//!
//! Every `update_*` and `delete_*` method reports a missing record as
//! [`StoreError::NotFound`](super::StoreError::NotFound); none of them silently
//! do nothing.

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    AttendanceRecord, Document, Invoice, MarksRecord, MessageRecord, MessageStatus, NewAttendance,
    NewDocument, NewInvoice, NewMark, NewMessageRecord, NewParentLog, NewStudent, ParentLog,
    Student, UserProfile,
};

/// Trait defining the interface for student storage operations
#[async_trait]
pub trait StudentStorage: Send + Sync {
    /// List all students in insertion order
    async fn list_students(&self) -> Result<Vec<Student>>;

    /// Retrieve a specific student by ID
    async fn get_student(&self, student_id: &str) -> Result<Option<Student>>;

    /// Store a new student and return the generated ID
    async fn add_student(&self, student: &NewStudent) -> Result<String>;

    /// Overwrite an existing student
    async fn update_student(&self, student: &Student) -> Result<()>;

    async fn delete_student(&self, student_id: &str) -> Result<()>;
}

#[async_trait]
pub trait AttendanceStorage: Send + Sync {
    /// All attendance records for one student
    async fn get_attendance(&self, student_id: &str) -> Result<Vec<AttendanceRecord>>;

    async fn get_attendance_record(&self, attendance_id: &str) -> Result<Option<AttendanceRecord>>;

    async fn add_attendance(&self, attendance: &NewAttendance) -> Result<String>;

    async fn update_attendance(&self, attendance: &AttendanceRecord) -> Result<()>;

    async fn delete_attendance(&self, attendance_id: &str) -> Result<()>;
}

#[async_trait]
pub trait MarksStorage: Send + Sync {
    async fn get_marks_for_student(&self, student_id: &str) -> Result<Vec<MarksRecord>>;

    async fn get_mark(&self, mark_id: &str) -> Result<Option<MarksRecord>>;

    async fn add_mark_for_student(&self, mark: &NewMark) -> Result<String>;

    async fn update_mark_for_student(&self, mark: &MarksRecord) -> Result<()>;

    async fn delete_mark_for_student(&self, mark_id: &str) -> Result<()>;
}

#[async_trait]
pub trait InvoiceStorage: Send + Sync {
    /// List invoices, optionally restricted to one student
    async fn get_invoices(&self, student_id: Option<&str>) -> Result<Vec<Invoice>>;

    async fn get_invoice(&self, invoice_id: &str) -> Result<Option<Invoice>>;

    async fn add_invoice(&self, invoice: &NewInvoice) -> Result<String>;

    async fn update_invoice(&self, invoice: &Invoice) -> Result<()>;

    async fn delete_invoice(&self, invoice_id: &str) -> Result<()>;
}

#[async_trait]
pub trait ParentLogStorage: Send + Sync {
    async fn get_parent_logs(&self, student_id: &str) -> Result<Vec<ParentLog>>;

    async fn add_parent_log(&self, log: &NewParentLog) -> Result<String>;

    async fn delete_parent_log(&self, log_id: &str) -> Result<()>;
}

#[async_trait]
pub trait DocumentStorage: Send + Sync {
    async fn get_documents(&self, student_id: &str) -> Result<Vec<Document>>;

    async fn add_document(&self, document: &NewDocument) -> Result<String>;

    async fn delete_document(&self, document_id: &str) -> Result<()>;
}

/// Log of messages handed to messaging providers
#[async_trait]
pub trait MessageLogStorage: Send + Sync {
    async fn add_message(&self, message: &NewMessageRecord) -> Result<String>;

    async fn get_messages(&self, student_id: &str) -> Result<Vec<MessageRecord>>;

    /// Update the status of the message the provider knows by `provider_message_id`
    async fn update_message_status(
        &self,
        provider_message_id: &str,
        status: MessageStatus,
    ) -> Result<()>;
}

/// Trait defining the sign-in surface of the backend
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile>;

    async fn sign_out(&self) -> Result<()>;

    async fn current_user(&self) -> Result<Option<UserProfile>>;
}

/// Everything the domain layer needs from a backend, as one object
pub trait DataStore:
    StudentStorage
    + AttendanceStorage
    + MarksStorage
    + InvoiceStorage
    + ParentLogStorage
    + DocumentStorage
    + MessageLogStorage
    + AuthProvider
{
}

impl<T> DataStore for T where
    T: StudentStorage
        + AttendanceStorage
        + MarksStorage
        + InvoiceStorage
        + ParentLogStorage
        + DocumentStorage
        + MessageLogStorage
        + AuthProvider
{
}

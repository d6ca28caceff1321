//! # In-memory data store
//!
//! Stand-in for the hosted document store during local development and
//! tests. Each collection is an ordered `Vec` behind a `tokio` lock, every
//! call waits out a simulated network latency first, and nothing beyond
//! "the record with this ID exists" is enforced: duplicate content,
//! orphaned `student_id` references and unvalidated fields are all accepted.

mod collection;
mod seed;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::traits::{
    AttendanceStorage, AuthProvider, DocumentStorage, InvoiceStorage, MarksStorage,
    MessageLogStorage, ParentLogStorage, StudentStorage,
};
use super::StoreError;
use collection::Collection;
pub use collection::generate_id;
use shared::{
    AttendanceRecord, Document, Invoice, MarksRecord, MessageRecord, MessageStatus, NewAttendance,
    NewDocument, NewInvoice, NewMark, NewMessageRecord, NewParentLog, NewStudent, ParentLog,
    Student, UserProfile,
};

/// Accounts the mock sign-in recognises: (email, display name, role)
const KNOWN_USERS: &[(&str, &str, &str)] = &[
    ("admin@tutorhub.dev", "Admin", "admin"),
    ("tutor@tutorhub.dev", "Demo Tutor", "tutor"),
    ("demo@tutorhub.dev", "Demo Account", "viewer"),
];

/// In-memory implementation of every storage trait
pub struct MemoryStore {
    latency: Duration,
    students: Collection<Student>,
    attendance: Collection<AttendanceRecord>,
    marks: Collection<MarksRecord>,
    invoices: Collection<Invoice>,
    parent_logs: Collection<ParentLog>,
    documents: Collection<Document>,
    messages: Collection<MessageRecord>,
    current_user: RwLock<Option<UserProfile>>,
}

impl MemoryStore {
    /// Create an empty store whose operations each take `latency`
    pub fn new(latency: Duration) -> Self {
        info!("Creating in-memory data store (simulated latency {:?})", latency);
        Self {
            latency,
            students: Collection::new("students"),
            attendance: Collection::new("attendance"),
            marks: Collection::new("marks"),
            invoices: Collection::new("invoices"),
            parent_logs: Collection::new("parentLogs"),
            documents: Collection::new("documents"),
            messages: Collection::new("messages"),
            current_user: RwLock::new(None),
        }
    }

    /// Empty store with no simulated latency
    pub fn init_test() -> Self {
        Self::new(Duration::ZERO)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    async fn insert<T: collection::Record>(&self, collection: &Collection<T>, record: T) -> String {
        let id = record.id().to_string();
        collection.push(record).await;
        debug!("Added {} record {}", collection.name(), id);
        id
    }
}

#[async_trait]
impl StudentStorage for MemoryStore {
    async fn list_students(&self) -> Result<Vec<Student>> {
        self.simulate_latency().await;
        Ok(self.students.filter(|_| true).await)
    }

    async fn get_student(&self, student_id: &str) -> Result<Option<Student>> {
        self.simulate_latency().await;
        Ok(self.students.find(student_id).await)
    }

    async fn add_student(&self, student: &NewStudent) -> Result<String> {
        self.simulate_latency().await;
        let now = Utc::now();
        let record = Student {
            id: generate_id("student"),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            name: Student::full_name(&student.first_name, &student.last_name),
            email: student.email.clone(),
            phone: student.phone.clone(),
            grade: student.grade.clone(),
            subjects: student.subjects.clone(),
            parent_contact: student.parent_contact.clone(),
            preferred_currency: student.preferred_currency,
            rates: student.rates.clone(),
            created_at: now,
            updated_at: now,
        };
        Ok(self.insert(&self.students, record).await)
    }

    async fn update_student(&self, student: &Student) -> Result<()> {
        self.simulate_latency().await;
        self.students.replace(student.clone()).await?;
        Ok(())
    }

    async fn delete_student(&self, student_id: &str) -> Result<()> {
        self.simulate_latency().await;
        self.students.remove(student_id).await?;
        Ok(())
    }
}

#[async_trait]
impl AttendanceStorage for MemoryStore {
    async fn get_attendance(&self, student_id: &str) -> Result<Vec<AttendanceRecord>> {
        self.simulate_latency().await;
        Ok(self.attendance.filter(|a| a.student_id == student_id).await)
    }

    async fn get_attendance_record(&self, attendance_id: &str) -> Result<Option<AttendanceRecord>> {
        self.simulate_latency().await;
        Ok(self.attendance.find(attendance_id).await)
    }

    async fn add_attendance(&self, attendance: &NewAttendance) -> Result<String> {
        self.simulate_latency().await;
        let record = AttendanceRecord {
            id: generate_id("attendance"),
            student_id: attendance.student_id.clone(),
            date: attendance.date,
            session_type: attendance.session_type,
            duration_hours: attendance.duration_hours,
            status: attendance.status,
            notes: attendance.notes.clone(),
            created_at: Utc::now(),
        };
        Ok(self.insert(&self.attendance, record).await)
    }

    async fn update_attendance(&self, attendance: &AttendanceRecord) -> Result<()> {
        self.simulate_latency().await;
        self.attendance.replace(attendance.clone()).await?;
        Ok(())
    }

    async fn delete_attendance(&self, attendance_id: &str) -> Result<()> {
        self.simulate_latency().await;
        self.attendance.remove(attendance_id).await?;
        Ok(())
    }
}

#[async_trait]
impl MarksStorage for MemoryStore {
    async fn get_marks_for_student(&self, student_id: &str) -> Result<Vec<MarksRecord>> {
        self.simulate_latency().await;
        Ok(self.marks.filter(|m| m.student_id == student_id).await)
    }

    async fn get_mark(&self, mark_id: &str) -> Result<Option<MarksRecord>> {
        self.simulate_latency().await;
        Ok(self.marks.find(mark_id).await)
    }

    async fn add_mark_for_student(&self, mark: &NewMark) -> Result<String> {
        self.simulate_latency().await;
        let now = Utc::now();
        let record = MarksRecord {
            id: generate_id("mark"),
            student_id: mark.student_id.clone(),
            subject: mark.subject.clone(),
            term: mark.term.clone(),
            mark: mark.mark,
            comment: mark.comment.clone(),
            created_at: now,
            updated_at: now,
        };
        Ok(self.insert(&self.marks, record).await)
    }

    async fn update_mark_for_student(&self, mark: &MarksRecord) -> Result<()> {
        self.simulate_latency().await;
        self.marks.replace(mark.clone()).await?;
        Ok(())
    }

    async fn delete_mark_for_student(&self, mark_id: &str) -> Result<()> {
        self.simulate_latency().await;
        self.marks.remove(mark_id).await?;
        Ok(())
    }
}

#[async_trait]
impl InvoiceStorage for MemoryStore {
    async fn get_invoices(&self, student_id: Option<&str>) -> Result<Vec<Invoice>> {
        self.simulate_latency().await;
        Ok(self
            .invoices
            .filter(|i| student_id.map_or(true, |id| i.student_id == id))
            .await)
    }

    async fn get_invoice(&self, invoice_id: &str) -> Result<Option<Invoice>> {
        self.simulate_latency().await;
        Ok(self.invoices.find(invoice_id).await)
    }

    async fn add_invoice(&self, invoice: &NewInvoice) -> Result<String> {
        self.simulate_latency().await;
        let now = Utc::now();
        let record = Invoice {
            id: generate_id("invoice"),
            student_id: invoice.student_id.clone(),
            amount: invoice.amount,
            currency: invoice.currency,
            status: invoice.status,
            line_items: invoice.line_items.clone(),
            extra_charges: invoice.extra_charges.clone(),
            period_start: invoice.period_start,
            period_end: invoice.period_end,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            created_at: now,
            updated_at: now,
        };
        Ok(self.insert(&self.invoices, record).await)
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<()> {
        self.simulate_latency().await;
        self.invoices.replace(invoice.clone()).await?;
        Ok(())
    }

    async fn delete_invoice(&self, invoice_id: &str) -> Result<()> {
        self.simulate_latency().await;
        self.invoices.remove(invoice_id).await?;
        Ok(())
    }
}

#[async_trait]
impl ParentLogStorage for MemoryStore {
    async fn get_parent_logs(&self, student_id: &str) -> Result<Vec<ParentLog>> {
        self.simulate_latency().await;
        Ok(self.parent_logs.filter(|l| l.student_id == student_id).await)
    }

    async fn add_parent_log(&self, log: &NewParentLog) -> Result<String> {
        self.simulate_latency().await;
        let record = ParentLog {
            id: generate_id("parentLog"),
            student_id: log.student_id.clone(),
            date: log.date,
            channel: log.channel.clone(),
            summary: log.summary.clone(),
            created_at: Utc::now(),
        };
        Ok(self.insert(&self.parent_logs, record).await)
    }

    async fn delete_parent_log(&self, log_id: &str) -> Result<()> {
        self.simulate_latency().await;
        self.parent_logs.remove(log_id).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStorage for MemoryStore {
    async fn get_documents(&self, student_id: &str) -> Result<Vec<Document>> {
        self.simulate_latency().await;
        Ok(self.documents.filter(|d| d.student_id == student_id).await)
    }

    async fn add_document(&self, document: &NewDocument) -> Result<String> {
        self.simulate_latency().await;
        let record = Document {
            id: generate_id("document"),
            student_id: document.student_id.clone(),
            title: document.title.clone(),
            file_name: document.file_name.clone(),
            url: document.url.clone(),
            uploaded_at: Utc::now(),
        };
        Ok(self.insert(&self.documents, record).await)
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.simulate_latency().await;
        self.documents.remove(document_id).await?;
        Ok(())
    }
}

#[async_trait]
impl MessageLogStorage for MemoryStore {
    async fn add_message(&self, message: &NewMessageRecord) -> Result<String> {
        self.simulate_latency().await;
        let now = Utc::now();
        let record = MessageRecord {
            id: generate_id("message"),
            student_id: message.student_id.clone(),
            invoice_id: message.invoice_id.clone(),
            platform: message.platform,
            kind: message.kind,
            provider_message_id: message.provider_message_id.clone(),
            status: MessageStatus::Sent,
            created_at: now,
            updated_at: now,
        };
        Ok(self.insert(&self.messages, record).await)
    }

    async fn get_messages(&self, student_id: &str) -> Result<Vec<MessageRecord>> {
        self.simulate_latency().await;
        Ok(self.messages.filter(|m| m.student_id == student_id).await)
    }

    async fn update_message_status(
        &self,
        provider_message_id: &str,
        status: MessageStatus,
    ) -> Result<()> {
        self.simulate_latency().await;
        let updated = self
            .messages
            .modify_where(
                |m| m.provider_message_id == provider_message_id,
                |m| {
                    m.status = status;
                    m.updated_at = Utc::now();
                },
            )
            .await;

        match updated {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found("messages", provider_message_id).into()),
        }
    }
}

#[async_trait]
impl AuthProvider for MemoryStore {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<UserProfile> {
        self.simulate_latency().await;
        let normalized = email.trim().to_ascii_lowercase();

        let (known_email, display_name, role) = KNOWN_USERS
            .iter()
            .find(|(known, _, _)| *known == normalized)
            .ok_or_else(|| {
                warn!("Sign-in rejected for unknown email: {}", normalized);
                StoreError::UserNotFound(normalized.clone())
            })?;

        let profile = UserProfile {
            uid: format!("mock-uid-{}", role),
            email: known_email.to_string(),
            display_name: display_name.to_string(),
            role: role.to_string(),
        };
        *self.current_user.write().await = Some(profile.clone());
        info!("Signed in {} as {}", profile.email, profile.role);
        Ok(profile)
    }

    async fn sign_out(&self) -> Result<()> {
        self.simulate_latency().await;
        *self.current_user.write().await = None;
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<UserProfile>> {
        Ok(self.current_user.read().await.clone())
    }
}

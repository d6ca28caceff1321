use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Currency codes a student's billing can be denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Zar,
    Usd,
    Gbp,
    Eur,
    Aed,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Zar,
        Currency::Usd,
        Currency::Gbp,
        Currency::Eur,
        Currency::Aed,
    ];

    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Zar => "ZAR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Aed => "AED",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Zar
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ZAR" => Ok(Currency::Zar),
            "USD" => Ok(Currency::Usd),
            "GBP" => Ok(Currency::Gbp),
            "EUR" => Ok(Currency::Eur),
            "AED" => Ok(Currency::Aed),
            other => Err(format!("Unsupported currency code: {}", other)),
        }
    }
}

/// Kind of tutoring session, used to pick a billing rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Online,
    InPersonClass,
    InPersonOneOnOne,
}

impl SessionType {
    pub const ALL: [SessionType; 3] = [
        SessionType::Online,
        SessionType::InPersonClass,
        SessionType::InPersonOneOnOne,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SessionType::Online => "Online",
            SessionType::InPersonClass => "In-person class",
            SessionType::InPersonOneOnOne => "In-person 1:1",
        }
    }
}

/// Per-session-type rate table, denominated in one currency
pub type SessionRates = BTreeMap<SessionType, Decimal>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Excused,
}

impl AttendanceStatus {
    /// Whether a session with this status is charged for
    pub fn is_billable(&self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    /// Sent or overdue invoices still await payment
    pub fn is_outstanding(&self) -> bool {
        matches!(self, InvoiceStatus::Sent | InvoiceStatus::Overdue)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        };
        f.write_str(s)
    }
}

/// Messaging platform used to reach a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    WhatsApp,
    WeChat,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::WhatsApp => f.write_str("whatsapp"),
            Platform::WeChat => f.write_str("wechat"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Invoice,
    Reminder,
}

/// Delivery status of an outbound message, as reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

impl FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sent" => Ok(MessageStatus::Sent),
            "delivered" => Ok(MessageStatus::Delivered),
            "read" => Ok(MessageStatus::Read),
            "failed" => Ok(MessageStatus::Failed),
            other => Err(format!("Unknown message status: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Students
// ---------------------------------------------------------------------------

/// How to reach a student's parent or guardian
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParentContact {
    pub name: String,
    /// Phone number used for WhatsApp delivery
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub wechat_open_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Student ID in format: "student::<uuid>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Always `first_name + " " + last_name`
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub grade: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub parent_contact: ParentContact,
    /// Missing on records written before multi-currency billing existed
    #[serde(default)]
    pub preferred_currency: Option<Currency>,
    /// Rate overrides in the preferred currency
    #[serde(default)]
    pub rates: SessionRates,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn full_name(first_name: &str, last_name: &str) -> String {
        format!("{} {}", first_name, last_name)
    }

    /// Preferred currency, falling back to the default for legacy records
    pub fn billing_currency(&self) -> Currency {
        self.preferred_currency.unwrap_or_default()
    }
}

/// Student data as handed to storage, before an id is assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub grade: String,
    pub subjects: Vec<String>,
    pub parent_contact: ParentContact,
    pub preferred_currency: Option<Currency>,
    pub rates: SessionRates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStudentRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub grade: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub parent_contact: ParentContact,
    #[serde(default)]
    pub preferred_currency: Option<Currency>,
    /// Explicit rates; anything missing is filled from the defaults
    #[serde(default)]
    pub rates: SessionRates,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateStudentRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub grade: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub parent_contact: Option<ParentContact>,
    pub preferred_currency: Option<Currency>,
    pub rates: Option<SessionRates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentResponse {
    pub student: Student,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyMigrationResponse {
    pub migrated_count: usize,
    pub total_students: usize,
}

// ---------------------------------------------------------------------------
// Attendance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub session_type: SessionType,
    pub duration_hours: Decimal,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAttendance {
    pub student_id: String,
    pub date: NaiveDate,
    pub session_type: SessionType,
    pub duration_hours: Decimal,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Marks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarksRecord {
    pub id: String,
    pub student_id: String,
    pub subject: String,
    pub term: String,
    /// Percentage, 0 to 100
    pub mark: f64,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMark {
    pub student_id: String,
    pub subject: String,
    pub term: String,
    pub mark: f64,
    #[serde(default)]
    pub comment: Option<String>,
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

/// Billed hours of one session type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub session_type: SessionType,
    pub sessions: u32,
    pub hours: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraCharge {
    pub description: String,
    pub amount: Decimal,
}

/// Invoice ID in format: "invoice::<uuid>"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub student_id: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub line_items: Vec<InvoiceLineItem>,
    #[serde(default)]
    pub extra_charges: Vec<ExtraCharge>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub student_id: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: InvoiceStatus,
    pub line_items: Vec<InvoiceLineItem>,
    pub extra_charges: Vec<ExtraCharge>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateInvoiceRequest {
    pub student_id: String,
    /// Inclusive bounds; open-ended when absent
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    #[serde(default)]
    pub extra_charges: Vec<ExtraCharge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInvoiceStatusRequest {
    pub status: InvoiceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkOverdueResponse {
    pub updated_invoice_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Auxiliary per-student records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentLog {
    pub id: String,
    pub student_id: String,
    pub date: NaiveDate,
    /// How the parent was contacted (call, email, meeting, ...)
    pub channel: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewParentLog {
    pub student_id: String,
    pub date: NaiveDate,
    pub channel: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub student_id: String,
    pub title: String,
    pub file_name: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub student_id: String,
    pub title: String,
    pub file_name: String,
    pub url: String,
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

/// Uniform outcome of a send attempt on any platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
    pub platform: Option<Platform>,
}

impl MessageResult {
    pub fn sent(platform: Platform, message_id: impl Into<String>) -> Self {
        Self {
            success: true,
            message_id: Some(message_id.into()),
            error: None,
            platform: Some(platform),
        }
    }

    pub fn failed(platform: Option<Platform>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
            platform,
        }
    }
}

/// Log entry for a message handed to a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub student_id: String,
    pub invoice_id: Option<String>,
    pub platform: Platform,
    pub kind: MessageKind,
    pub provider_message_id: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessageRecord {
    pub student_id: String,
    pub invoice_id: Option<String>,
    pub platform: Platform,
    pub kind: MessageKind,
    pub provider_message_id: String,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Currency utilities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertCurrencyRequest {
    pub amount: Decimal,
    pub from: Currency,
    pub to: Currency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertCurrencyResponse {
    pub amount: Decimal,
    pub from: Currency,
    pub to: Currency,
    pub converted: Decimal,
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesResponse {
    pub currency: Currency,
    pub rates: SessionRates,
}

/// Structured pass/fail of an amount check; never raised as an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub student_id: String,
    pub student_name: String,
    pub currency: Currency,
    pub attendance_by_status: BTreeMap<String, u32>,
    pub billable_hours: BTreeMap<SessionType, Decimal>,
    pub average_mark: Option<f64>,
    pub average_mark_by_subject: BTreeMap<String, f64>,
    pub invoice_totals: BTreeMap<InvoiceStatus, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingOverview {
    pub reporting_currency: Currency,
    pub outstanding_by_currency: BTreeMap<Currency, Decimal>,
    pub outstanding_total: Decimal,
    pub outstanding_invoice_count: usize,
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListQuery {
    /// Cursor for pagination - record ID to start after
    pub after: Option<String>,
    /// Maximum number of records to return
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginationInfo {
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

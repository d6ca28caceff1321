use anyhow::Result;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use crate::domain::errors::DomainError;
use crate::storage::{DataStore, StoreError};
use shared::{AttendanceRecord, NewAttendance};

/// Longest session that can be recorded in one entry
const MAX_SESSION_HOURS: i64 = 12;

/// Service for recording attendance
#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn DataStore>,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Attendance for one student, most recent session first
    pub async fn get_attendance(&self, student_id: &str) -> Result<Vec<AttendanceRecord>> {
        let mut records = self.store.get_attendance(student_id).await?;
        records.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
        Ok(records)
    }

    pub async fn record_attendance(&self, request: NewAttendance) -> Result<AttendanceRecord> {
        info!(
            "Recording {:?} {:?} session for {} on {} ({}h)",
            request.status, request.session_type, request.student_id, request.date, request.duration_hours
        );

        self.validate(&request)?;
        if self.store.get_student(&request.student_id).await?.is_none() {
            return Err(StoreError::not_found("students", &request.student_id).into());
        }

        let id = self.store.add_attendance(&request).await?;
        self.store
            .get_attendance_record(&id)
            .await?
            .ok_or_else(|| StoreError::not_found("attendance", &id).into())
    }

    /// Overwrite an attendance record with new values
    pub async fn update_attendance(
        &self,
        attendance_id: &str,
        request: NewAttendance,
    ) -> Result<AttendanceRecord> {
        info!("Updating attendance: {}", attendance_id);
        self.validate(&request)?;

        let existing = self
            .store
            .get_attendance_record(attendance_id)
            .await?
            .ok_or_else(|| StoreError::not_found("attendance", attendance_id))?;

        let record = AttendanceRecord {
            id: existing.id,
            student_id: request.student_id,
            date: request.date,
            session_type: request.session_type,
            duration_hours: request.duration_hours,
            status: request.status,
            notes: request.notes,
            created_at: existing.created_at,
        };
        self.store.update_attendance(&record).await?;
        Ok(record)
    }

    pub async fn delete_attendance(&self, attendance_id: &str) -> Result<()> {
        info!("Deleting attendance: {}", attendance_id);
        self.store.delete_attendance(attendance_id).await
    }

    fn validate(&self, request: &NewAttendance) -> Result<()> {
        if request.duration_hours <= Decimal::ZERO {
            return Err(DomainError::validation("Duration must be greater than zero").into());
        }
        if request.duration_hours > Decimal::new(MAX_SESSION_HOURS, 0) {
            return Err(DomainError::validation(format!(
                "Duration cannot exceed {} hours",
                MAX_SESSION_HOURS
            ))
            .into());
        }
        if request.duration_hours.normalize().scale() > 2 {
            return Err(DomainError::validation("Duration cannot have more than 2 decimal places").into());
        }
        Ok(())
    }
}

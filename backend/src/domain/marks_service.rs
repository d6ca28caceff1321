use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::domain::errors::DomainError;
use crate::storage::{DataStore, StoreError};
use shared::{MarksRecord, NewMark};

#[derive(Clone)]
pub struct MarksService {
    store: Arc<dyn DataStore>,
}

impl MarksService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn get_marks_for_student(&self, student_id: &str) -> Result<Vec<MarksRecord>> {
        let mut marks = self.store.get_marks_for_student(student_id).await?;
        marks.sort_by(|a, b| a.term.cmp(&b.term).then_with(|| a.subject.cmp(&b.subject)));
        Ok(marks)
    }

    pub async fn add_mark(&self, request: NewMark) -> Result<MarksRecord> {
        info!(
            "Adding {} mark for {}: {} ({})",
            request.subject, request.student_id, request.mark, request.term
        );
        validate_mark(&request)?;

        let id = self.store.add_mark_for_student(&request).await?;
        self.store
            .get_mark(&id)
            .await?
            .ok_or_else(|| StoreError::not_found("marks", &id).into())
    }

    pub async fn update_mark(&self, mark_id: &str, request: NewMark) -> Result<MarksRecord> {
        info!("Updating mark: {}", mark_id);
        validate_mark(&request)?;

        let existing = self
            .store
            .get_mark(mark_id)
            .await?
            .ok_or_else(|| StoreError::not_found("marks", mark_id))?;

        let record = MarksRecord {
            id: existing.id,
            student_id: request.student_id,
            subject: request.subject.trim().to_string(),
            term: request.term.trim().to_string(),
            mark: request.mark,
            comment: request.comment,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        self.store.update_mark_for_student(&record).await?;
        Ok(record)
    }

    pub async fn delete_mark(&self, mark_id: &str) -> Result<()> {
        info!("Deleting mark: {}", mark_id);
        self.store.delete_mark_for_student(mark_id).await
    }
}

fn validate_mark(request: &NewMark) -> Result<()> {
    if !(0.0..=100.0).contains(&request.mark) {
        return Err(DomainError::validation("Mark must be between 0 and 100").into());
    }
    if request.subject.trim().is_empty() {
        return Err(DomainError::validation("Subject cannot be empty").into());
    }
    if request.term.trim().is_empty() {
        return Err(DomainError::validation("Term cannot be empty").into());
    }
    Ok(())
}

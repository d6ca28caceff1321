//! Parent contact logs and student documents.
//!
//! These are auxiliary per-student records with no rules beyond non-empty
//! fields; they are created, listed and deleted, never edited.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::domain::errors::DomainError;
use crate::storage::DataStore;
use shared::{Document, NewDocument, NewParentLog, ParentLog};

#[derive(Clone)]
pub struct RecordsService {
    store: Arc<dyn DataStore>,
}

impl RecordsService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Parent logs for a student, newest first
    pub async fn get_parent_logs(&self, student_id: &str) -> Result<Vec<ParentLog>> {
        let mut logs = self.store.get_parent_logs(student_id).await?;
        logs.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(logs)
    }

    pub async fn add_parent_log(&self, request: NewParentLog) -> Result<String> {
        require_non_empty("Summary", &request.summary)?;
        require_non_empty("Channel", &request.channel)?;

        let id = self.store.add_parent_log(&request).await?;
        info!("Logged {} contact for {}: {}", request.channel, request.student_id, id);
        Ok(id)
    }

    pub async fn delete_parent_log(&self, log_id: &str) -> Result<()> {
        self.store.delete_parent_log(log_id).await
    }

    pub async fn get_documents(&self, student_id: &str) -> Result<Vec<Document>> {
        self.store.get_documents(student_id).await
    }

    pub async fn add_document(&self, request: NewDocument) -> Result<String> {
        require_non_empty("Title", &request.title)?;
        require_non_empty("URL", &request.url)?;

        let id = self.store.add_document(&request).await?;
        info!("Attached document '{}' to {}", request.title, request.student_id);
        Ok(id)
    }

    pub async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.store.delete_document(document_id).await
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{} cannot be empty", field)).into());
    }
    Ok(())
}

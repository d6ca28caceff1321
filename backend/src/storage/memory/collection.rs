//! Ordered in-process collection backing one logical table of the memory store.

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::storage::StoreError;
use shared::{
    AttendanceRecord, Document, Invoice, MarksRecord, MessageRecord, ParentLog, Student,
};

/// A record that can live in a [`Collection`]
pub trait Record: Clone + Send + Sync {
    fn id(&self) -> &str;
}

macro_rules! impl_record {
    ($($ty:ty),* $(,)?) => {
        $(impl Record for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_record!(Student, AttendanceRecord, MarksRecord, Invoice, ParentLog, Document, MessageRecord);

/// Generate a record ID in format: "<prefix>::<uuid v4>"
pub fn generate_id(prefix: &str) -> String {
    format!("{}::{}", prefix, Uuid::new_v4())
}

/// Vec-backed collection. Lookups are linear scans; there is no index.
pub struct Collection<T> {
    name: &'static str,
    records: RwLock<Vec<T>>,
}

impl<T: Record> Collection<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Clones of every record matching `predicate`, in insertion order
    pub async fn filter<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| predicate(*record))
            .cloned()
            .collect()
    }

    pub async fn find(&self, id: &str) -> Option<T> {
        self.records
            .read()
            .await
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    /// Find the first record matching `predicate` and mutate it in place
    pub async fn modify_where<P, F>(&self, predicate: P, apply: F) -> Option<T>
    where
        P: Fn(&T) -> bool,
        F: FnOnce(&mut T),
    {
        let mut records = self.records.write().await;
        let record = records.iter_mut().find(|record| predicate(&**record))?;
        apply(record);
        Some(record.clone())
    }

    pub async fn push(&self, record: T) {
        self.records.write().await.push(record);
    }

    /// Overwrite the record with the same ID
    pub async fn replace(&self, record: T) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|existing| existing.id() == record.id()) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(StoreError::not_found(self.name, record.id())),
        }
    }

    /// Remove exactly one record with the given ID
    pub async fn remove(&self, id: &str) -> Result<T, StoreError> {
        let mut records = self.records.write().await;
        match records.iter().position(|record| record.id() == id) {
            Some(index) => Ok(records.remove(index)),
            None => Err(StoreError::not_found(self.name, id)),
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

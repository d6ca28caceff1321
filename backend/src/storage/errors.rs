use thiserror::Error;

/// Failures reported by storage backends
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{collection} record not found: {id}")]
    NotFound { collection: &'static str, id: String },

    /// Mirrors the hosted backend's "auth/user-not-found" condition
    #[error("auth/user-not-found: no user record for {0}")]
    UserNotFound(String),
}

impl StoreError {
    pub fn not_found(collection: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            collection,
            id: id.into(),
        }
    }
}

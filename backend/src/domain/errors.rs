use shared::InvoiceStatus;
use thiserror::Error;

/// Business-rule failures raised by domain services
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invoice cannot move from {from} to {to}")]
    InvalidStatusTransition { from: InvoiceStatus, to: InvoiceStatus },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}

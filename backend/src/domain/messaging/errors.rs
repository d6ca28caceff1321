use thiserror::Error;

/// Failures inside a provider client.
///
/// These never leave the client: every send converts them into a failed
/// `MessageResult`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MessagingError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// Error reported in a 2xx body, e.g. WeChat's `errcode`
    #[error("Provider error {code}: {message}")]
    Provider { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl MessagingError {
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_secs: u64) -> Self {
        if e.is_timeout() {
            MessagingError::Timeout(timeout_secs)
        } else {
            MessagingError::Transport(e.to_string())
        }
    }
}

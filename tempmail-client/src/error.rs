// tempmail-client/src/error.rs
use crate::http::HttpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailboxError {
    /// Remote API unreachable, non-success status or malformed response
    #[error("mailbox service error: {0}")]
    Service(String),
    /// Invalid or expired token, or rejected account credentials
    #[error("mailbox authentication failed: {0}")]
    Auth(String),
    /// Rejected locally before any request was made
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl MailboxError {
    pub fn malformed(what: impl std::fmt::Display) -> Self {
        MailboxError::Service(format!("malformed response: {}", what))
    }
}

impl From<HttpError> for MailboxError {
    fn from(err: HttpError) -> Self {
        if err.is_unauthorized() {
            MailboxError::Auth(err.to_string())
        } else {
            MailboxError::Service(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MailboxError {
    fn from(err: serde_json::Error) -> Self {
        MailboxError::malformed(err)
    }
}

pub type Result<T> = std::result::Result<T, MailboxError>;

// ghostmail-client/src/error.rs
use std::path::PathBuf;
use tempmail_client::MailboxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Remote mailbox API unreachable or answering with a non-success status
    #[error("service error: {0}")]
    Service(String),
    /// Invalid or expired token or credentials
    #[error("authentication error: {0}")]
    Auth(String),
    /// Decryption failed its authentication check
    #[error("integrity check failed: wrong passphrase or corrupted credential file")]
    Integrity,
    /// This build carries no authenticated cipher
    #[error("authenticated encryption is not available in this build")]
    Unavailable,
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Attachment could not be decoded as an image
    #[error("not a decodable image: {0}")]
    Format(String),
    /// SMTP transport or authentication failure
    #[error("send failed: {0}")]
    Send(String),
    #[error("encryption failed")]
    Encrypt,
    /// Caller-supplied value refused before touching the network
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable name of the variant, used in machine-readable output
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Service(_) => "service_error",
            Error::Auth(_) => "auth_error",
            Error::Integrity => "integrity_error",
            Error::Unavailable => "unavailable",
            Error::NotFound(_) => "not_found",
            Error::Format(_) => "format_error",
            Error::Send(_) => "send_error",
            Error::Encrypt => "encrypt_error",
            Error::InvalidInput(_) => "validation_failed",
            Error::Config(_) => "config_error",
            Error::Io(_) => "io_error",
        }
    }

    pub(crate) fn send(err: impl std::fmt::Display) -> Self {
        Error::Send(err.to_string())
    }
}

impl From<MailboxError> for Error {
    fn from(err: MailboxError) -> Self {
        match err {
            MailboxError::Service(msg) => Error::Service(msg),
            MailboxError::Auth(msg) => Error::Auth(msg),
            MailboxError::InvalidInput(msg) => Error::InvalidInput(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_errors_keep_their_class() {
        let err: Error = MailboxError::Auth("expired".to_string()).into();
        assert!(matches!(err, Error::Auth(_)));
        assert_eq!(err.kind(), "auth_error");

        let err: Error = MailboxError::Service("503".to_string()).into();
        assert_eq!(err.kind(), "service_error");

        let err: Error = MailboxError::InvalidInput("bad id".to_string()).into();
        assert_eq!(err.kind(), "validation_failed");
    }

    #[test]
    fn test_not_found_message_names_path() {
        let err = Error::NotFound(PathBuf::from("/tmp/credentials.enc"));
        assert_eq!(err.to_string(), "not found: /tmp/credentials.enc");
    }
}

pub mod accounts;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod error;
mod files;
pub mod network;
pub mod sanitizer;
pub mod sender;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use credentials::{CredentialBundle, CredentialStore};
pub use error::{Error, Result};
pub use network::NetworkPolicy;
pub use sender::{Security, SendReport, SendRequest, SmtpSettings};

// Re-export mailbox types for convenience
pub use tempmail_client::{MailboxAccount, MessageDetail, MessageSummary};

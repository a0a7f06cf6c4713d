// tempmail-client/src/lib.rs
pub mod client;
pub mod error;
pub mod generator;
pub mod http;
pub mod types;

pub use client::MailboxClient;
pub use error::{MailboxError, Result};
pub use generator::{random_local_part, random_password};
pub use http::{HttpClient, HttpError};
pub use types::{AttachmentMeta, MailboxAccount, MailboxApiConfig, MessageDetail, MessageSummary};

// Re-export reqwest client when feature is enabled
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;

// tempmail-client/src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Endpoint layout of a disposable-mailbox provider.
///
/// Defaults match the mail.tm API. `collection_key` names the field of the
/// envelope that holds list results; an empty key means the response body
/// is the list itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_collection_key")]
    pub collection_key: String,
    #[serde(default = "default_domains_path")]
    pub domains_path: String,
    #[serde(default = "default_accounts_path")]
    pub accounts_path: String,
    #[serde(default = "default_token_path")]
    pub token_path: String,
    #[serde(default = "default_messages_path")]
    pub messages_path: String,
}

fn default_base_url() -> String {
    "https://api.mail.tm".to_string()
}

fn default_collection_key() -> String {
    "hydra:member".to_string()
}

fn default_domains_path() -> String {
    "/domains".to_string()
}

fn default_accounts_path() -> String {
    "/accounts".to_string()
}

fn default_token_path() -> String {
    "/token".to_string()
}

fn default_messages_path() -> String {
    "/messages".to_string()
}

impl Default for MailboxApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            collection_key: default_collection_key(),
            domains_path: default_domains_path(),
            accounts_path: default_accounts_path(),
            token_path: default_token_path(),
            messages_path: default_messages_path(),
        }
    }
}

impl MailboxApiConfig {
    /// Default layout pointed at another base URL
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// A disposable account and the token that unlocks it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxAccount {
    pub address: String,
    pub password: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageSummary {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub preview: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageDetail {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub created_at: DateTime<Utc>,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub attachments: Vec<AttachmentMeta>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentMeta {
    pub filename: String,
    pub content_type: String,
    pub size: u64,
}

// Wire types

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DomainRecord {
    pub domain: String,
    #[serde(rename = "isActive")]
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub(crate) struct Credentials<'a> {
    pub address: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AddressRecord {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl AddressRecord {
    pub fn display(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{} <{}>", name, self.address),
            _ => self.address.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageRecord {
    pub id: String,
    #[serde(default)]
    pub from: Option<AddressRecord>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<MessageRecord> for MessageSummary {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            from: record.from.map(|f| f.display()).unwrap_or_default(),
            subject: record.subject.unwrap_or_default(),
            preview: record.intro.unwrap_or_default(),
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageDetailRecord {
    pub id: String,
    #[serde(default)]
    pub from: Option<AddressRecord>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AttachmentRecord {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(rename = "contentType")]
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
}

impl From<MessageDetailRecord> for MessageDetail {
    fn from(record: MessageDetailRecord) -> Self {
        let html_body = if record.html.is_empty() {
            None
        } else {
            Some(record.html.join("\n"))
        };

        Self {
            id: record.id,
            from: record.from.map(|f| f.display()).unwrap_or_default(),
            subject: record.subject.unwrap_or_default(),
            created_at: record.created_at,
            text_body: record.text.filter(|t| !t.is_empty()),
            html_body,
            attachments: record
                .attachments
                .into_iter()
                .map(|a| AttachmentMeta {
                    filename: a.filename.unwrap_or_else(|| "unnamed".to_string()),
                    content_type: a
                        .content_type
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                    size: a.size,
                })
                .collect(),
        }
    }
}

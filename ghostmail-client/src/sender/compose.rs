// ghostmail-client/src/sender/compose.rs
use crate::error::{Error, Result};
use crate::sanitizer::{is_image_path, strip};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Mail as the caller describes it, before attachments are read
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

/// Attachment bytes ready to go into the MIME tree
#[derive(Debug, Clone)]
pub struct PreparedAttachment {
    pub path: PathBuf,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// Whether the bytes came out of the metadata stripper
    pub sanitized: bool,
}

/// Why an attachment was left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for AttachmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped attachment {}: {}", self.path.display(), self.reason)
    }
}

/// Result of processing a single attachment. Skips are recoverable; the
/// send goes on without that file.
#[derive(Debug)]
pub enum AttachmentOutcome {
    Attached(PreparedAttachment),
    Skipped(AttachmentWarning),
}

pub fn prepare_attachment(path: &Path, strip_metadata: bool) -> AttachmentOutcome {
    let skip = |reason: String| {
        AttachmentOutcome::Skipped(AttachmentWarning {
            path: path.to_path_buf(),
            reason,
        })
    };

    if !path.is_file() {
        return skip("file not found".to_string());
    }

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());

    if strip_metadata && is_image_path(path) {
        return match strip(path) {
            Ok(sanitized) => AttachmentOutcome::Attached(PreparedAttachment {
                path: path.to_path_buf(),
                filename,
                content_type: sanitized.content_type().to_string(),
                bytes: sanitized.bytes,
                sanitized: true,
            }),
            Err(e) => skip(e.to_string()),
        };
    }

    match fs::read(path) {
        Ok(bytes) => AttachmentOutcome::Attached(PreparedAttachment {
            path: path.to_path_buf(),
            filename,
            content_type: mime_guess::from_path(path)
                .first_raw()
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string(),
            bytes,
            sanitized: false,
        }),
        Err(e) => skip(e.to_string()),
    }
}

/// A built message plus what happened to each attachment
#[derive(Debug)]
pub struct ComposedMessage {
    pub message: Message,
    pub recipients: Vec<String>,
    pub attached: Vec<PreparedAttachment>,
    pub warnings: Vec<AttachmentWarning>,
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .trim()
        .parse()
        .map_err(|e| Error::Send(format!("invalid address '{}': {}", address, e)))
}

/// Recipients without duplicates (case-insensitive), first spelling kept
fn unique_recipients(to: &[String]) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    let mut unique = Vec::new();
    for address in to.iter().map(|a| a.trim()).filter(|a| !a.is_empty()) {
        let key = address.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            unique.push(address.to_string());
        }
    }
    unique
}

/// Build the multipart message. Attachment problems become warnings;
/// malformed addresses fail the whole message.
pub fn compose(outbound: &OutboundMessage, strip_metadata: bool) -> Result<ComposedMessage> {
    let recipients = unique_recipients(&outbound.to);
    if recipients.is_empty() {
        return Err(Error::Send("no recipients".to_string()));
    }

    let mut builder = Message::builder()
        .from(parse_mailbox(&outbound.from)?)
        .subject(outbound.subject.clone());
    for address in &recipients {
        builder = builder.to(parse_mailbox(address)?);
    }

    let mut attached = Vec::new();
    let mut warnings = Vec::new();
    for path in &outbound.attachments {
        match prepare_attachment(path, strip_metadata) {
            AttachmentOutcome::Attached(prepared) => attached.push(prepared),
            AttachmentOutcome::Skipped(warning) => warnings.push(warning),
        }
    }

    let mut multipart = MultiPart::mixed().singlepart(SinglePart::plain(outbound.body.clone()));
    for prepared in &attached {
        let content_type = ContentType::parse(&prepared.content_type)
            .or_else(|_| ContentType::parse(DEFAULT_CONTENT_TYPE))
            .map_err(Error::send)?;
        multipart = multipart.singlepart(
            Attachment::new(prepared.filename.clone()).body(prepared.bytes.clone(), content_type),
        );
    }

    let message = builder.multipart(multipart).map_err(Error::send)?;

    Ok(ComposedMessage {
        message,
        recipients,
        attached,
        warnings,
    })
}

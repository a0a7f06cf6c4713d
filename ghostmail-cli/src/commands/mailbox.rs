// ghostmail-cli/src/commands/mailbox.rs
use super::Context;
use crate::output::{emit, header, print_success, Formattable, OutputFormat};
use anyhow::Result;
use chrono::Local;
use clap::Args;
use ghostmail_client::accounts::{load_account, save_account};
use ghostmail_client::{Error, MailboxAccount, MessageDetail, MessageSummary};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Clone, Debug)]
pub struct CreateTempArgs {
    /// Local part of the address [default: random]
    #[arg(short, long)]
    pub username: Option<String>,
    /// Account password [default: random]
    #[arg(short, long)]
    pub password: Option<String>,
    /// Write the account to this file for later `--account` use
    #[arg(long)]
    pub save: Option<PathBuf>,
}

/// Which mailbox to read: a bearer token or a saved account file
#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = false)]
pub struct TokenArgs {
    /// Bearer token from `create-temp`
    #[arg(long)]
    pub token: Option<String>,
    /// Account file written by `create-temp --save`
    #[arg(long)]
    pub account: Option<PathBuf>,
}

impl TokenArgs {
    fn resolve(&self) -> Result<String> {
        match (&self.token, &self.account) {
            (Some(token), _) => Ok(token.clone()),
            (None, Some(path)) => Ok(load_account(path)?.token),
            (None, None) => anyhow::bail!("either --token or --account is required"),
        }
    }
}

#[derive(Serialize)]
struct DomainsView {
    domains: Vec<String>,
}

impl Formattable for DomainsView {
    fn to_human(&self) -> String {
        if self.domains.is_empty() {
            return "No active domains".to_string();
        }
        self.domains.join("\n")
    }
}

#[derive(Serialize)]
struct AccountView {
    #[serde(flatten)]
    account: MailboxAccount,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_to: Option<PathBuf>,
}

impl Formattable for AccountView {
    fn to_human(&self) -> String {
        let mut lines = vec![
            header("Address", &self.account.address),
            header("Password", &self.account.password),
            header("Token", &self.account.token),
        ];
        if let Some(path) = &self.saved_to {
            lines.push(header("Saved to", &path.display().to_string()));
        }
        lines.join("\n")
    }
}

#[derive(Serialize)]
struct MessagesView {
    messages: Vec<MessageSummary>,
    count: usize,
}

impl Formattable for MessagesView {
    fn to_human(&self) -> String {
        if self.messages.is_empty() {
            return "No messages".to_string();
        }
        self.messages
            .iter()
            .map(|m| {
                format!(
                    "{}  {}  {}  {}",
                    m.id,
                    m.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    m.from,
                    m.subject
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Serialize)]
struct MessageView {
    #[serde(flatten)]
    message: MessageDetail,
}

impl Formattable for MessageView {
    fn to_human(&self) -> String {
        let m = &self.message;
        let mut out = vec![
            header("From", &m.from),
            header("Subject", &m.subject),
            header(
                "Date",
                &m.created_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
        ];
        for a in &m.attachments {
            out.push(header(
                "Attachment",
                &format!("{} ({}, {} bytes)", a.filename, a.content_type, a.size),
            ));
        }
        out.push(String::new());
        match (&m.text_body, &m.html_body) {
            (Some(text), _) => out.push(text.clone()),
            (None, Some(html)) => out.push(html.clone()),
            (None, None) => out.push("(empty message)".to_string()),
        }
        out.join("\n")
    }
}

pub async fn handle_domains(ctx: &Context) -> Result<()> {
    let client = ctx.network.mailbox_client(ctx.config.mailbox.clone())?;
    let domains = client.list_domains().await.map_err(Error::from)?;
    emit(&DomainsView { domains }, ctx.format)
}

pub async fn handle_create_temp(ctx: &Context, args: CreateTempArgs) -> Result<()> {
    let client = ctx.network.mailbox_client(ctx.config.mailbox.clone())?;
    let account = client
        .create_account(args.username.as_deref(), args.password.as_deref())
        .await
        .map_err(Error::from)?;

    if let Some(path) = &args.save {
        save_account(path, &account)?;
        if ctx.format == OutputFormat::Human {
            print_success(&format!("Account saved to {}", path.display()));
        }
    }

    emit(
        &AccountView {
            account,
            saved_to: args.save,
        },
        ctx.format,
    )
}

pub async fn handle_list(ctx: &Context, auth: TokenArgs, limit: usize) -> Result<()> {
    let token = auth.resolve()?;
    let client = ctx.network.mailbox_client(ctx.config.mailbox.clone())?;
    let messages = client
        .list_messages(&token, limit)
        .await
        .map_err(Error::from)?;
    let count = messages.len();
    emit(&MessagesView { messages, count }, ctx.format)
}

pub async fn handle_read(ctx: &Context, auth: TokenArgs, id: &str) -> Result<()> {
    let token = auth.resolve()?;
    let client = ctx.network.mailbox_client(ctx.config.mailbox.clone())?;
    let message = client.read_message(&token, id).await.map_err(Error::from)?;
    emit(&MessageView { message }, ctx.format)
}

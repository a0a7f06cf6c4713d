// ghostmail-cli/src/commands/send.rs
use super::Context;
use crate::output::{emit, header, Formattable};
use crate::prompt;
use anyhow::{bail, Context as _, Result};
use clap::Args;
use ghostmail_client::sender::{self, OutboundMessage, Security, SmtpAuth};
use ghostmail_client::{CredentialBundle, CredentialStore, SendReport, SendRequest, SmtpSettings};
use serde::Serialize;
use std::path::PathBuf;

const DEFAULT_SUBJECT: &str = "(no subject)";

#[derive(Args, Clone, Debug)]
pub struct SendArgs {
    /// Recipient address (repeatable)
    #[arg(long, required = true)]
    pub to: Vec<String>,
    #[arg(short, long)]
    pub subject: Option<String>,
    #[arg(short, long, conflicts_with = "body_file")]
    pub body: Option<String>,
    /// Read the body from a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,
    /// Attach a file (repeatable)
    #[arg(short, long)]
    pub attach: Vec<String>,
    /// Send images as-is instead of re-encoding them without metadata
    #[arg(long)]
    pub keep_metadata: bool,
    /// Disable STARTTLS (port 465 still uses TLS)
    #[arg(long)]
    pub no_tls: bool,
    #[arg(long)]
    pub server: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    /// SMTP username; no username means no AUTH
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long)]
    pub from: Option<String>,
    /// Take server, port and login from the credential store
    #[arg(long)]
    pub creds: bool,
    /// With --creds, read the unencrypted credential file
    #[arg(long, requires = "creds")]
    pub plaintext: bool,
}

/// `~` and `~/...` resolve against the home directory
pub fn expand_tilde(raw: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (raw, home) {
        ("~", Some(home)) => home,
        (s, Some(home)) if s.starts_with("~/") => home.join(&s[2..]),
        (s, _) => PathBuf::from(s),
    }
}

fn read_body(args: &SendArgs) -> Result<String> {
    match (&args.body, &args.body_file) {
        (Some(body), _) => Ok(body.clone()),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading body from {}", path.display())),
        (None, None) => Ok(String::new()),
    }
}

fn load_bundle(ctx: &Context, plaintext: bool) -> Result<CredentialBundle> {
    let store = CredentialStore::from_config(&ctx.config)?;
    if plaintext {
        return Ok(store.load(None)?);
    }
    let passphrase = prompt::passphrase()?;
    Ok(store.load(Some(&passphrase))?)
}

/// Merge flags, stored credentials and config defaults; flags win.
fn smtp_settings(ctx: &Context, args: &SendArgs) -> Result<SmtpSettings> {
    let defaults = &ctx.config.smtp;
    let stored = if args.creds {
        Some(load_bundle(ctx, args.plaintext)?)
    } else {
        None
    };

    let server = args
        .server
        .clone()
        .or_else(|| stored.as_ref().map(|b| b.smtp_server.clone()))
        .or_else(|| defaults.server.clone());
    let Some(server) = server else {
        bail!("no SMTP server: pass --server, use --creds or set [smtp].server in the config");
    };

    let port = args
        .port
        .or_else(|| stored.as_ref().map(|b| b.smtp_port))
        .unwrap_or(defaults.port);

    let auth = match (&args.user, stored) {
        (Some(user), Some(bundle)) if *user == bundle.smtp_user => Some(SmtpAuth {
            username: bundle.smtp_user,
            password: bundle.smtp_password,
        }),
        (Some(user), _) => Some(SmtpAuth {
            username: user.clone(),
            password: prompt::secret(&format!("SMTP password for {}", user))?,
        }),
        (None, Some(bundle)) if !bundle.smtp_user.is_empty() => Some(SmtpAuth {
            username: bundle.smtp_user,
            password: bundle.smtp_password,
        }),
        (None, _) => None,
    };

    Ok(SmtpSettings {
        server,
        port,
        auth,
        use_tls: defaults.use_tls && !args.no_tls,
        hello_name: defaults.hello_name.clone(),
    })
}

fn sender_address(ctx: &Context, args: &SendArgs, smtp: &SmtpSettings) -> Result<String> {
    if let Some(from) = args.from.clone().or_else(|| ctx.config.smtp.from.clone()) {
        return Ok(from);
    }
    match &smtp.auth {
        Some(auth) if auth.username.contains('@') => Ok(auth.username.clone()),
        _ => bail!("no sender address: pass --from or set [smtp].from in the config"),
    }
}

#[derive(Serialize)]
struct SendView {
    #[serde(flatten)]
    report: SendReport,
    server: String,
}

impl Formattable for SendView {
    fn to_human(&self) -> String {
        let security = match self.report.security {
            Security::ImplicitTls => "implicit TLS",
            Security::StartTls => "STARTTLS",
            Security::Plain => "no TLS",
        };
        let mut lines = vec![
            format!("Sent via {} ({})", self.server, security),
            header("To", &self.report.recipients.join(", ")),
        ];
        if !self.report.attached.is_empty() {
            lines.push(header("Attached", &self.report.attached.join(", ")));
        }
        for warning in &self.report.warnings {
            lines.push(header("Skipped", warning));
        }
        lines.join("\n")
    }
}

pub async fn handle_send(ctx: &Context, args: SendArgs) -> Result<()> {
    let smtp = smtp_settings(ctx, &args)?;
    let from = sender_address(ctx, &args, &smtp)?;
    let body = read_body(&args)?;
    let server = format!("{}:{}", smtp.server, smtp.port);

    let request = SendRequest {
        smtp,
        message: OutboundMessage {
            from,
            to: args.to.clone(),
            subject: args
                .subject
                .clone()
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            body,
            attachments: args.attach.iter().map(|a| expand_tilde(a)).collect(),
        },
        strip_image_metadata: !args.keep_metadata,
    };

    let report = sender::send(&request, &ctx.network).await?;
    emit(&SendView { report, server }, ctx.format)
}

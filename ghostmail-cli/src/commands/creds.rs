// ghostmail-cli/src/commands/creds.rs
use super::Context;
use crate::output::{emit, header, print_warning, Formattable, OutputFormat};
use crate::prompt;
use anyhow::Result;
use clap::Args;
use ghostmail_client::{CredentialBundle, CredentialStore};
use serde::Serialize;
use std::path::PathBuf;

const MASK: &str = "********";

#[derive(Args, Clone, Debug)]
pub struct SaveCredsArgs {
    #[arg(long)]
    pub server: String,
    #[arg(long, default_value = "587")]
    pub port: u16,
    #[arg(long)]
    pub user: String,
    /// SMTP password [default: prompt]
    #[arg(long)]
    pub password: Option<String>,
    /// Write the unencrypted file instead
    #[arg(long)]
    pub plaintext: bool,
}

#[derive(Args, Clone, Debug)]
pub struct ShowCredsArgs {
    /// Read the unencrypted file
    #[arg(long)]
    pub plaintext: bool,
    /// Print the password instead of a mask
    #[arg(long)]
    pub reveal: bool,
}

#[derive(Serialize)]
struct SavedView {
    path: PathBuf,
    encrypted: bool,
}

impl Formattable for SavedView {
    fn to_human(&self) -> String {
        let what = if self.encrypted {
            "Encrypted credentials"
        } else {
            "Plaintext credentials"
        };
        format!("{} saved to {}", what, self.path.display())
    }
}

#[derive(Serialize)]
struct CredsView {
    server: String,
    port: u16,
    user: String,
    password: String,
}

impl CredsView {
    fn new(bundle: CredentialBundle, reveal: bool) -> Self {
        Self {
            server: bundle.smtp_server,
            port: bundle.smtp_port,
            user: bundle.smtp_user,
            password: if reveal {
                bundle.smtp_password
            } else {
                MASK.to_string()
            },
        }
    }
}

impl Formattable for CredsView {
    fn to_human(&self) -> String {
        [
            header("Server", &self.server),
            header("Port", &self.port.to_string()),
            header("User", &self.user),
            header("Password", &self.password),
        ]
        .join("\n")
    }
}

pub async fn handle_save_creds(ctx: &Context, args: SaveCredsArgs) -> Result<()> {
    let store = CredentialStore::from_config(&ctx.config)?;
    let password = match args.password {
        Some(p) => p,
        None => prompt::secret("SMTP password")?,
    };
    let bundle = CredentialBundle {
        smtp_server: args.server,
        smtp_port: args.port,
        smtp_user: args.user,
        smtp_password: password,
    };

    let encrypt = !args.plaintext && store.can_encrypt();
    if !args.plaintext && !encrypt && ctx.format == OutputFormat::Human {
        print_warning("encryption is not available in this build; writing a plaintext file");
    }

    let path = if encrypt {
        let passphrase = prompt::new_passphrase()?;
        store.save(&bundle, Some(&passphrase))?
    } else {
        store.save(&bundle, None)?
    };

    emit(
        &SavedView {
            path,
            encrypted: encrypt,
        },
        ctx.format,
    )
}

pub async fn handle_show_creds(ctx: &Context, args: ShowCredsArgs) -> Result<()> {
    let store = CredentialStore::from_config(&ctx.config)?;
    let bundle = if args.plaintext {
        store.load(None)?
    } else {
        let passphrase = prompt::passphrase()?;
        store.load(Some(&passphrase))?
    };
    emit(&CredsView::new(bundle, args.reveal), ctx.format)
}

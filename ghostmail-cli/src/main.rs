mod commands;
mod output;
mod prompt;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{
    ConfigCommands, Context, CreateTempArgs, SaveCredsArgs, SendArgs, ShowCredsArgs, TokenArgs,
};
use ghostmail_client::Config;
use output::{report_error, ExitCode, OutputFormat};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ghostmail")]
#[command(about = "Disposable mailboxes and metadata-scrubbed mail from the command line", long_about = None)]
struct Cli {
    /// Route all traffic through the configured SOCKS5 proxy
    #[arg(long, global = true)]
    tor: bool,
    /// SOCKS5 proxy as host:port (implies --tor)
    #[arg(long, global = true)]
    proxy: Option<String>,
    /// Network timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Machine-readable output
    #[arg(long, global = true)]
    json: bool,
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the provider's active domains
    Domains,
    /// Create a disposable mailbox
    CreateTemp(CreateTempArgs),
    /// List messages in a disposable mailbox
    List {
        #[command(flatten)]
        auth: TokenArgs,
        /// Max number of messages
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Read one message
    Read {
        /// Message ID
        id: String,
        #[command(flatten)]
        auth: TokenArgs,
    },
    /// Send a message through an SMTP relay
    Send(SendArgs),
    /// Store SMTP credentials (encrypted unless --plaintext)
    SaveCreds(SaveCredsArgs),
    /// Show stored SMTP credentials
    ShowCreds(ShowCredsArgs),
    /// Configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let format = OutputFormat::from_flag(cli.json);
    let code = match run(cli, format).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            report_error(&e, format);
            ExitCode::Failure
        }
    };
    std::process::exit(code.code());
}

async fn run(cli: Cli, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let network = config.network_policy(cli.tor, cli.proxy.as_deref(), cli.timeout);
    tracing::debug!(proxy = ?network.proxy(), timeout = ?network.timeout(), "network policy");

    let ctx = Context {
        config,
        network,
        format,
    };

    match cli.command {
        Commands::Domains => commands::handle_domains(&ctx).await,
        Commands::CreateTemp(args) => commands::handle_create_temp(&ctx, args).await,
        Commands::List { auth, limit } => commands::handle_list(&ctx, auth, limit).await,
        Commands::Read { id, auth } => commands::handle_read(&ctx, auth, &id).await,
        Commands::Send(args) => commands::handle_send(&ctx, args).await,
        Commands::SaveCreds(args) => commands::handle_save_creds(&ctx, args).await,
        Commands::ShowCreds(args) => commands::handle_show_creds(&ctx, args).await,
        Commands::Config(cmd) => commands::handle_config(&ctx, cmd).await,
    }
}

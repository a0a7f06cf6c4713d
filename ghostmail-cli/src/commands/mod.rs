// ghostmail-cli/src/commands/mod.rs
pub mod config;
pub mod creds;
pub mod mailbox;
pub mod send;

use crate::output::OutputFormat;
use ghostmail_client::{Config, NetworkPolicy};

/// Everything a command needs from the global flags
pub struct Context {
    pub config: Config,
    pub network: NetworkPolicy,
    pub format: OutputFormat,
}

pub use config::{handle_config, ConfigCommands};
pub use creds::{handle_save_creds, handle_show_creds, SaveCredsArgs, ShowCredsArgs};
pub use mailbox::{handle_create_temp, handle_domains, handle_list, handle_read, CreateTempArgs, TokenArgs};
pub use send::{handle_send, SendArgs};

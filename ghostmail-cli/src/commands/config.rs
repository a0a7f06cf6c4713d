// ghostmail-cli/src/commands/config.rs
use super::Context;
use crate::output::{emit, Formattable};
use anyhow::Result;
use clap::Subcommand;
use ghostmail_client::Config;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigCommands {
    /// Print the config file location
    Path,
    /// Print the effective configuration (file plus environment)
    Show,
}

#[derive(Serialize)]
struct PathView {
    path: PathBuf,
    credentials_dir: PathBuf,
}

impl Formattable for PathView {
    fn to_human(&self) -> String {
        format!(
            "{}\ncredentials: {}",
            self.path.display(),
            self.credentials_dir.display()
        )
    }
}

#[derive(Serialize)]
struct ShowView<'a> {
    #[serde(flatten)]
    config: &'a Config,
}

impl Formattable for ShowView<'_> {
    fn to_human(&self) -> String {
        toml::to_string_pretty(self.config).unwrap_or_else(|e| format!("# unprintable: {}", e))
    }
}

pub async fn handle_config(ctx: &Context, cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Path => emit(
            &PathView {
                path: Config::config_path()?,
                credentials_dir: ctx.config.credentials_dir()?,
            },
            ctx.format,
        ),
        ConfigCommands::Show => emit(
            &ShowView {
                config: &ctx.config,
            },
            ctx.format,
        ),
    }
}

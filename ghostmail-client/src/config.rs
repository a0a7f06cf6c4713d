// ghostmail-client/src/config.rs
use crate::error::{Error, Result};
use crate::files::write_private;
use crate::network::NetworkPolicy;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempmail_client::MailboxApiConfig;

const APP_DIR: &str = "ghostmail";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Disposable-mailbox provider endpoints
    #[serde(default)]
    pub mailbox: MailboxApiConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    /// Defaults for `send` when no stored credentials are used
    #[serde(default)]
    pub smtp: SmtpDefaults,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// SOCKS5 proxy used when proxy routing is requested
    #[serde(default = "default_proxy")]
    pub proxy: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_proxy() -> String {
    "127.0.0.1:9050".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: default_proxy(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpDefaults {
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
    /// Name announced in EHLO; keeps the local hostname off the wire
    #[serde(default = "default_hello_name")]
    pub hello_name: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_use_tls() -> bool {
    true
}

fn default_hello_name() -> String {
    "localhost".to_string()
}

impl Default for SmtpDefaults {
    fn default() -> Self {
        Self {
            server: None,
            port: default_smtp_port(),
            from: None,
            use_tls: default_use_tls(),
            hello_name: default_hello_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StorageConfig {
    /// Where the credential files live; defaults to the platform data dir
    #[serde(default)]
    pub credentials_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            let default = Self::default();
            default.save_to(&config_path)?;
            default
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        write_private(path, content.as_bytes())
    }

    /// Environment variables win over the file
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(proxy) = lookup("GHOSTMAIL_PROXY") {
            self.network.proxy = proxy;
        }
        if let Some(url) = lookup("GHOSTMAIL_MAILBOX_URL") {
            self.mailbox.base_url = url;
        }
        if let Some(dir) = lookup("GHOSTMAIL_CREDENTIALS_DIR") {
            self.storage.credentials_dir = Some(PathBuf::from(dir));
        }
    }

    pub fn config_dir() -> Result<PathBuf> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| Error::Config("Cannot determine config directory".to_string()))?;
        Ok(base_dirs.config_dir().join(APP_DIR))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Directory holding the credential files
    pub fn credentials_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage.credentials_dir {
            return Ok(dir.clone());
        }
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| Error::Config("Cannot determine data directory".to_string()))?;
        Ok(base_dirs.data_dir().join(APP_DIR))
    }

    /// Build the network policy for one process run.
    ///
    /// An explicit proxy implies proxy routing.
    pub fn network_policy(
        &self,
        via_proxy: bool,
        proxy_override: Option<&str>,
        timeout_override: Option<u64>,
    ) -> NetworkPolicy {
        let timeout = Duration::from_secs(timeout_override.unwrap_or(self.network.timeout_secs));
        match proxy_override {
            Some(proxy) => NetworkPolicy::via_proxy(proxy, timeout),
            None if via_proxy => NetworkPolicy::via_proxy(&self.network.proxy, timeout),
            None => NetworkPolicy::direct(timeout),
        }
    }
}

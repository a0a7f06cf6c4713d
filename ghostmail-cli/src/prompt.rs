// ghostmail-cli/src/prompt.rs
use anyhow::{bail, Result};
use dialoguer::Password;
use std::io::IsTerminal;

pub const PASSPHRASE_ENV: &str = "GHOSTMAIL_PASSPHRASE";

fn require_terminal(what: &str) -> Result<()> {
    if !std::io::stdin().is_terminal() {
        bail!("{} required but stdin is not a terminal", what);
    }
    Ok(())
}

/// Hidden single-entry prompt
pub fn secret(prompt: &str) -> Result<String> {
    require_terminal(prompt)?;
    Ok(Password::new().with_prompt(prompt).interact()?)
}

fn env_passphrase<F>(lookup: F) -> Result<Option<String>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(PASSPHRASE_ENV) {
        Some(p) if p.is_empty() => bail!("{} is set but empty", PASSPHRASE_ENV),
        other => Ok(other),
    }
}

/// Passphrase for unlocking stored credentials
pub fn passphrase() -> Result<String> {
    if let Some(p) = env_passphrase(|k| std::env::var(k).ok())? {
        return Ok(p);
    }
    secret("Passphrase")
}

/// Passphrase for a new encrypted file, typed twice
pub fn new_passphrase() -> Result<String> {
    if let Some(p) = env_passphrase(|k| std::env::var(k).ok())? {
        return Ok(p);
    }
    require_terminal("Passphrase")?;
    Ok(Password::new()
        .with_prompt("New passphrase")
        .with_confirmation("Confirm passphrase", "Passphrases do not match")
        .interact()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_passphrase_used_when_set() {
        let p = env_passphrase(|_| Some("hunter2".to_string())).unwrap();
        assert_eq!(p.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_env_passphrase_absent() {
        assert!(env_passphrase(|_| None).unwrap().is_none());
    }

    #[test]
    fn test_empty_env_passphrase_rejected() {
        assert!(env_passphrase(|_| Some(String::new())).is_err());
    }
}

// ghostmail-client/src/accounts.rs
use crate::error::{Error, Result};
use crate::files::{read_existing, write_private};
use std::path::Path;
use tempmail_client::MailboxAccount;

/// Keep a disposable account (address, password, token) in a private JSON file
pub fn save_account(path: &Path, account: &MailboxAccount) -> Result<()> {
    let content =
        serde_json::to_vec_pretty(account).map_err(|e| Error::Config(e.to_string()))?;
    write_private(path, &content)
}

pub fn load_account(path: &Path) -> Result<MailboxAccount> {
    let content = read_existing(path)?;
    serde_json::from_slice(&content)
        .map_err(|e| Error::Config(format!("{} is not a saved account: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.json");
        let account = MailboxAccount {
            address: "abc@example.com".to_string(),
            password: "pw".to_string(),
            token: "tok".to_string(),
            id: None,
        };

        save_account(&path, &account).unwrap();
        let loaded = load_account(&path).unwrap();
        assert_eq!(loaded.address, "abc@example.com");
        assert_eq!(loaded.token, "tok");
    }

    #[test]
    fn test_load_account_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("account.json");
        assert!(matches!(load_account(&path), Err(Error::NotFound(_))));

        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(load_account(&path), Err(Error::Config(_))));
    }
}

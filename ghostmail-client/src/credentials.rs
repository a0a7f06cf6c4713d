// ghostmail-client/src/credentials.rs
use crate::config::Config;
use crate::crypto::{decode_blob, detect_cipher, encode_blob, BlobCipher};
use crate::error::{Error, Result};
use crate::files::{read_existing, write_private};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub const ENCRYPTED_FILE: &str = "credentials.enc";
/// The name says what it is so nobody mistakes it for the encrypted file
pub const PLAINTEXT_FILE: &str = "credentials.plaintext.json";

/// SMTP relay login
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialBundle {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_password", &"<redacted>")
            .finish()
    }
}

pub struct CredentialStore {
    dir: PathBuf,
    cipher: Option<Arc<dyn BlobCipher>>,
}

impl CredentialStore {
    pub fn new(dir: impl Into<PathBuf>, cipher: Option<Arc<dyn BlobCipher>>) -> Self {
        Self {
            dir: dir.into(),
            cipher,
        }
    }

    /// Store in the configured directory with whatever cipher this build has
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.credentials_dir()?, detect_cipher()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn encrypted_path(&self) -> PathBuf {
        self.dir.join(ENCRYPTED_FILE)
    }

    pub fn plaintext_path(&self) -> PathBuf {
        self.dir.join(PLAINTEXT_FILE)
    }

    pub fn can_encrypt(&self) -> bool {
        self.cipher.is_some()
    }

    fn cipher(&self) -> Result<&dyn BlobCipher> {
        self.cipher.as_deref().ok_or(Error::Unavailable)
    }

    /// Persist the bundle and return the path written.
    ///
    /// With a passphrase the bundle is encrypted; without one it goes to the
    /// plaintext file. Nothing is written unless encryption succeeded.
    pub fn save(&self, bundle: &CredentialBundle, passphrase: Option<&str>) -> Result<PathBuf> {
        let serialized =
            serde_json::to_vec(bundle).map_err(|e| Error::Config(e.to_string()))?;

        match passphrase {
            Some(passphrase) => {
                let blob = self.cipher()?.encrypt(&serialized, passphrase)?;
                let path = self.encrypted_path();
                write_private(&path, encode_blob(&blob).as_bytes())?;
                info!(path = %path.display(), "saved encrypted credentials");
                Ok(path)
            }
            None => {
                let path = self.plaintext_path();
                write_private(&path, &serialized)?;
                warn!(path = %path.display(), "saved credentials WITHOUT encryption");
                Ok(path)
            }
        }
    }

    /// Load the bundle; a passphrase selects the encrypted file, its absence
    /// the plaintext one.
    pub fn load(&self, passphrase: Option<&str>) -> Result<CredentialBundle> {
        let serialized = match passphrase {
            Some(passphrase) => {
                let cipher = self.cipher()?;
                let text = read_existing(&self.encrypted_path())?;
                let text = String::from_utf8(text).map_err(|_| Error::Integrity)?;
                cipher.decrypt(&decode_blob(&text)?, passphrase)?
            }
            None => read_existing(&self.plaintext_path())?,
        };

        serde_json::from_slice(&serialized)
            .map_err(|e| Error::Config(format!("credential file is not a valid bundle: {}", e)))
    }
}

#[cfg(all(test, feature = "aead"))]
mod tests {
    use super::*;
    use crate::crypto::Aes256GcmCipher;
    use std::fs;

    fn bundle() -> CredentialBundle {
        CredentialBundle {
            smtp_server: "smtp.mailtrap.io".to_string(),
            smtp_port: 587,
            smtp_user: "user@example.com".to_string(),
            smtp_password: "s3cret".to_string(),
        }
    }

    fn store(dir: &Path) -> CredentialStore {
        CredentialStore::new(dir, Some(Arc::new(Aes256GcmCipher::with_rounds(1_000))))
    }

    #[test]
    fn test_encrypted_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let path = store.save(&bundle(), Some("passphrase")).unwrap();
        assert_eq!(path, dir.path().join(ENCRYPTED_FILE));

        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(!on_disk.contains("s3cret"));
        assert!(!on_disk.contains("smtp.mailtrap.io"));

        assert_eq!(store.load(Some("passphrase")).unwrap(), bundle());
    }

    #[test]
    fn test_wrong_passphrase_is_integrity_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&bundle(), Some("right")).unwrap();

        assert!(matches!(store.load(Some("wrong")), Err(Error::Integrity)));
    }

    #[test]
    fn test_plaintext_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let path = store.save(&bundle(), None).unwrap();
        assert_eq!(path, dir.path().join(PLAINTEXT_FILE));
        assert!(!dir.path().join(ENCRYPTED_FILE).exists());
        assert_eq!(store.load(None).unwrap(), bundle());
    }

    #[test]
    fn test_load_without_passphrase_ignores_encrypted_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&bundle(), Some("passphrase")).unwrap();

        match store.load(None) {
            Err(Error::NotFound(path)) => assert_eq!(path, dir.path().join(PLAINTEXT_FILE)),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_load_encrypted_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&bundle(), None).unwrap();

        assert!(matches!(store.load(Some("pw")), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_corrupted_file_is_integrity_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&bundle(), Some("pw")).unwrap();

        fs::write(store.encrypted_path(), "AAAA").unwrap();
        assert!(matches!(store.load(Some("pw")), Err(Error::Integrity)));
    }

    #[test]
    fn test_without_cipher_encryption_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path(), None);

        assert!(!store.can_encrypt());
        assert!(matches!(store.save(&bundle(), Some("pw")), Err(Error::Unavailable)));
        assert!(!store.encrypted_path().exists());

        store.save(&bundle(), None).unwrap();
        assert_eq!(store.load(None).unwrap(), bundle());
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.save(&bundle(), Some("pw")).unwrap();
        let before = fs::read(store.encrypted_path()).unwrap();

        let plain_only = CredentialStore::new(dir.path(), None);
        assert!(plain_only.save(&bundle(), Some("pw")).is_err());
        assert_eq!(fs::read(store.encrypted_path()).unwrap(), before);
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", bundle());
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}

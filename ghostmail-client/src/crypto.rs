// ghostmail-client/src/crypto.rs
//! Passphrase-based authenticated encryption of credential blobs.
//!
//! Blob layout: `salt (16) || nonce (12) || tag (16) || ciphertext`. The key
//! is PBKDF2-HMAC-SHA256 over the passphrase and the embedded salt, so the
//! blob decrypts with nothing but the passphrase.

use crate::error::{Error, Result};
use base64::prelude::*;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use std::sync::Arc;

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const KEY_LEN: usize = 32;
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN + TAG_LEN;

/// PBKDF2 rounds per derivation
pub const PBKDF2_ITERATIONS: u32 = 200_000;

/// Derive a 32-byte key from a passphrase and salt
pub fn derive_key(passphrase: &str, salt: &[u8; SALT_LEN]) -> [u8; KEY_LEN] {
    derive_key_with_rounds(passphrase, salt, PBKDF2_ITERATIONS)
}

fn derive_key_with_rounds(passphrase: &str, salt: &[u8; SALT_LEN], rounds: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, rounds, &mut key);
    key
}

/// Authenticated cipher capability.
///
/// Decryption never returns data whose tag did not verify.
pub trait BlobCipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>>;
    fn decrypt(&self, blob: &[u8], passphrase: &str) -> Result<Vec<u8>>;
}

/// The cipher compiled into this build, if any
#[cfg(feature = "aead")]
pub fn detect_cipher() -> Option<Arc<dyn BlobCipher>> {
    Some(Arc::new(Aes256GcmCipher::new()))
}

#[cfg(not(feature = "aead"))]
pub fn detect_cipher() -> Option<Arc<dyn BlobCipher>> {
    None
}

pub fn encrypt(plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    detect_cipher()
        .ok_or(Error::Unavailable)?
        .encrypt(plaintext, passphrase)
}

pub fn decrypt(blob: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    detect_cipher()
        .ok_or(Error::Unavailable)?
        .decrypt(blob, passphrase)
}

/// Base64 text form of a blob, as stored on disk
pub fn encode_blob(blob: &[u8]) -> String {
    BASE64_STANDARD.encode(blob)
}

pub fn decode_blob(text: &str) -> Result<Vec<u8>> {
    BASE64_STANDARD
        .decode(text.trim())
        .map_err(|_| Error::Integrity)
}

/// Split a blob into its fixed-width fields
#[cfg_attr(not(feature = "aead"), allow(dead_code))]
fn split_blob(blob: &[u8]) -> Result<(&[u8; SALT_LEN], &[u8], &[u8], &[u8])> {
    if blob.len() < HEADER_LEN {
        return Err(Error::Integrity);
    }
    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce, rest) = rest.split_at(NONCE_LEN);
    let (tag, ciphertext) = rest.split_at(TAG_LEN);
    let salt: &[u8; SALT_LEN] = salt.try_into().map_err(|_| Error::Integrity)?;
    Ok((salt, nonce, tag, ciphertext))
}

#[cfg(feature = "aead")]
pub use self::aead_impl::Aes256GcmCipher;

#[cfg(feature = "aead")]
mod aead_impl {
    use super::*;
    use aes_gcm::aead::{AeadInPlace, KeyInit};
    use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
    use rand::rngs::OsRng;
    use rand::RngCore;

    /// AES-256-GCM keyed by PBKDF2-HMAC-SHA256
    pub struct Aes256GcmCipher {
        rounds: u32,
    }

    impl Aes256GcmCipher {
        pub fn new() -> Self {
            Self {
                rounds: PBKDF2_ITERATIONS,
            }
        }

        /// Cheap derivation for tests that run many decryptions
        #[cfg(test)]
        pub(crate) fn with_rounds(rounds: u32) -> Self {
            Self { rounds }
        }

        fn cipher(&self, passphrase: &str, salt: &[u8; SALT_LEN]) -> Aes256Gcm {
            let key = derive_key_with_rounds(passphrase, salt, self.rounds);
            Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key))
        }
    }

    impl Default for Aes256GcmCipher {
        fn default() -> Self {
            Self::new()
        }
    }

    impl BlobCipher for Aes256GcmCipher {
        fn encrypt(&self, plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
            let mut salt = [0u8; SALT_LEN];
            let mut nonce = [0u8; NONCE_LEN];
            OsRng.fill_bytes(&mut salt);
            OsRng.fill_bytes(&mut nonce);

            let mut buffer = plaintext.to_vec();
            let tag = self
                .cipher(passphrase, &salt)
                .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer)
                .map_err(|_| Error::Encrypt)?;

            let mut blob = Vec::with_capacity(HEADER_LEN + buffer.len());
            blob.extend_from_slice(&salt);
            blob.extend_from_slice(&nonce);
            blob.extend_from_slice(&tag);
            blob.extend_from_slice(&buffer);
            Ok(blob)
        }

        fn decrypt(&self, blob: &[u8], passphrase: &str) -> Result<Vec<u8>> {
            let (salt, nonce, tag, ciphertext) = split_blob(blob)?;

            let mut buffer = ciphertext.to_vec();
            self.cipher(passphrase, salt)
                .decrypt_in_place_detached(
                    Nonce::from_slice(nonce),
                    b"",
                    &mut buffer,
                    Tag::from_slice(tag),
                )
                .map_err(|_| Error::Integrity)?;
            Ok(buffer)
        }
    }
}

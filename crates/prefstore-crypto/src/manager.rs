use crate::error::{CryptoError, CryptoResult};

/// Encrypts and decrypts stored payloads.
///
/// Implementations must satisfy these invariants:
/// - `is_encryption_supported` is fixed for the lifetime of the manager.
/// - A payload encrypted under one tag never decrypts under another.
/// - Cipher text is a self-contained, persistable string.
pub trait EncryptionManager: Send + Sync {
    /// Whether this manager can encrypt at all.
    fn is_encryption_supported(&self) -> bool;

    /// Encrypt `clear_text`, binding it to `tag`.
    fn encrypt(&self, clear_text: &str, tag: &str) -> CryptoResult<String>;

    /// Decrypt `cipher_text` previously produced for `tag`.
    fn decrypt(&self, cipher_text: &str, tag: &str) -> CryptoResult<String>;
}

/// Manager for environments where encryption could not be set up.
#[derive(Clone, Debug)]
pub struct UnavailableEncryptionManager {
    reason: String,
}

impl UnavailableEncryptionManager {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Default for UnavailableEncryptionManager {
    fn default() -> Self {
        Self::new("no encryption key configured")
    }
}

impl EncryptionManager for UnavailableEncryptionManager {
    fn is_encryption_supported(&self) -> bool {
        false
    }

    fn encrypt(&self, _clear_text: &str, _tag: &str) -> CryptoResult<String> {
        Err(CryptoError::Unavailable(self.reason.clone()))
    }

    fn decrypt(&self, _cipher_text: &str, _tag: &str) -> CryptoResult<String> {
        Err(CryptoError::Unavailable(self.reason.clone()))
    }
}

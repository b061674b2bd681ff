use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::key::EncryptionKey;
use crate::manager::EncryptionManager;

const NONCE_LENGTH: usize = 12;
const AUTH_TAG_LENGTH: usize = 16;

/// ChaCha20-Poly1305 encryption manager.
///
/// Each payload gets a fresh random nonce. The associated tag (the entry key)
/// is authenticated as AEAD associated data, so cipher text copied to another
/// key fails to decrypt.
///
/// Cipher-text format: `base64(nonce || ciphertext || auth tag)`.
pub struct SealedEncryptionManager {
    cipher: ChaCha20Poly1305,
}

impl SealedEncryptionManager {
    pub fn new(key: &EncryptionKey) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key.as_bytes())),
        }
    }
}

impl EncryptionManager for SealedEncryptionManager {
    fn is_encryption_supported(&self) -> bool {
        true
    }

    fn encrypt(&self, clear_text: &str, tag: &str) -> CryptoResult<String> {
        let mut nonce = [0u8; NONCE_LENGTH];
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: clear_text.as_bytes(),
                    aad: tag.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::Encrypt)?;

        let mut framed = Vec::with_capacity(NONCE_LENGTH + sealed.len());
        framed.extend_from_slice(&nonce);
        framed.extend_from_slice(&sealed);
        Ok(STANDARD.encode(framed))
    }

    fn decrypt(&self, cipher_text: &str, tag: &str) -> CryptoResult<String> {
        let framed = STANDARD
            .decode(cipher_text)
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        if framed.len() < NONCE_LENGTH + AUTH_TAG_LENGTH {
            return Err(CryptoError::Encoding(format!(
                "payload too short: {} bytes",
                framed.len()
            )));
        }

        let (nonce, sealed) = framed.split_at(NONCE_LENGTH);
        let clear = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: tag.as_bytes(),
                },
            )
            .map_err(|_| CryptoError::Decrypt)?;

        String::from_utf8(clear).map_err(|e| CryptoError::Encoding(e.to_string()))
    }
}

impl std::fmt::Debug for SealedEncryptionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedEncryptionManager").finish_non_exhaustive()
    }
}

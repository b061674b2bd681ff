use std::fs;
use std::io::{self, Write};
use std::path::Path;

use rand::RngCore;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{CryptoError, CryptoResult};

/// Domain tag for passphrase key derivation.
const DERIVATION_CONTEXT: &str = "prefstore 2024-01-01 store encryption key v1";

/// Length of an encryption key in bytes.
pub const KEY_LENGTH: usize = 32;

/// 256-bit symmetric key used to seal stored values.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LENGTH]);

impl EncryptionKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LENGTH];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Derive a key from a passphrase with domain-separated BLAKE3.
    ///
    /// The same passphrase always yields the same key. Callers wanting
    /// brute-force resistance should stretch the passphrase first.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self(blake3::derive_key(DERIVATION_CONTEXT, passphrase.as_bytes()))
    }

    /// Parse a hex-encoded key.
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s.trim()).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let arr: [u8; KEY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            CryptoError::InvalidKey(format!("expected {KEY_LENGTH} bytes, got {}", b.len()))
        })?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Load the key stored at `path`, or generate and store a new one.
    ///
    /// The key file holds the hex-encoded key and is created with owner-only
    /// permissions on unix. A new key is written to a temporary file in the
    /// same directory and moved into place only once complete; when another
    /// process creates the file first, its key is used.
    pub fn load_or_generate(path: &Path) -> CryptoResult<Self> {
        if path.exists() {
            return Self::load(path);
        }

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let key = Self::generate();
        let mut tmp = NamedTempFile::new_in(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file().set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        tmp.write_all(key.to_hex().as_bytes())?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(path) {
            Ok(_) => {
                info!(path = %path.display(), "generated new encryption key");
                Ok(key)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Self::load(path),
            Err(e) => Err(e.error.into()),
        }
    }

    fn load(path: &Path) -> CryptoResult<Self> {
        let key = Self::from_hex(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), "loaded encryption key");
        Ok(key)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptionKey(<redacted>)")
    }
}

use prefstore_crypto::CryptoError;
use prefstore_types::{TypeError, ValueKind};
use tracing::warn;

/// Errors from the backing preference storage.
#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    /// The stored primitive has a different kind than the one requested.
    #[error("type mismatch for {key}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// The persisted file could not be parsed or written.
    #[error("format error: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for preference storage operations.
pub type PreferencesResult<T> = Result<T, PreferencesError>;

/// Errors from serialisers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SerialisationError {
    /// The byte-level encode or decode step failed.
    #[error("serialisation error: {0}")]
    Serialisation(String),

    /// The payload's embedded type does not match the requested type, or its
    /// format markers are missing.
    #[error("serialised type mismatch: expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },

    /// The serialiser was asked to handle a type it does not claim.
    #[error("{serialiser} serialiser cannot handle {type_name}")]
    UnsupportedType {
        serialiser: &'static str,
        type_name: String,
    },
}

/// Result alias for serialiser operations.
pub type SerialisationResult<T> = Result<T, SerialisationError>;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No serialiser claims the value's type; nothing was persisted.
    #[error("unsupported type: {type_name} cannot be serialised")]
    UnsupportedType { type_name: String },

    /// An encrypted store was used while encryption is not supported.
    #[error("encryption is not supported on this device")]
    EncryptionUnavailable,

    #[error(transparent)]
    Serialisation(#[from] SerialisationError),

    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    #[error("preferences error: {0}")]
    Preferences(#[from] PreferencesError),

    #[error("value conversion error: {0}")]
    Value(#[from] TypeError),
}

impl StoreError {
    /// Whether this failure must reach the caller.
    ///
    /// Every other failure is logged and swallowed by the typed store API.
    pub fn is_hard_failure(&self) -> bool {
        matches!(self, Self::UnsupportedType { .. } | Self::EncryptionUnavailable)
    }
}

impl From<CryptoError> for StoreError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Unavailable(_) => Self::EncryptionUnavailable,
            other => Self::Crypto(other),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Apply the write policy: hard failures propagate, the rest are logged.
pub(crate) fn settle_write(key: &str, result: StoreResult<()>) -> StoreResult<()> {
    match result {
        Err(e) if e.is_hard_failure() => Err(e),
        Err(e) => {
            warn!(key, error = %e, "write failed, nothing persisted");
            Ok(())
        }
        ok => ok,
    }
}

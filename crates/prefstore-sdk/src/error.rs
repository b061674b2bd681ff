use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] prefstore_store::StoreError),

    #[error("preferences error: {0}")]
    Preferences(#[from] prefstore_store::PreferencesError),

    #[error("crypto error: {0}")]
    Crypto(#[from] prefstore_crypto::CryptoError),

    #[error("invalid value: {0}")]
    Value(#[from] prefstore_types::TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// Whether encryption was required but is not available.
    pub fn is_encryption_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Store(prefstore_store::StoreError::EncryptionUnavailable)
        )
    }
}

pub type SdkResult<T> = Result<T, SdkError>;

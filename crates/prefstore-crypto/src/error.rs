use thiserror::Error;

/// Errors from encryption operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption is not supported by this manager.
    #[error("encryption unavailable: {0}")]
    Unavailable(String),

    #[error("encryption failed")]
    Encrypt,

    /// Wrong key, wrong tag, or tampered cipher text.
    #[error("decryption failed")]
    Decrypt,

    /// The cipher text string is not in the expected encoding.
    #[error("malformed cipher text: {0}")]
    Encoding(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

use thiserror::Error;

use crate::kind::ValueKind;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid store name {name:?}: {reason}")]
    InvalidStoreName { name: String, reason: String },

    #[error("kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: ValueKind, found: ValueKind },

    #[error("value out of range for {kind}: {value}")]
    OutOfRange { kind: ValueKind, value: String },

    #[error("document conversion error: {0}")]
    Document(String),
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Persistence policy of a store.
///
/// `PlainText` and `Encrypted` stores own their own namespace. `Lenient` and
/// `Forgetful` delegate to one of them, chosen once from encryption
/// availability when the store is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    /// Values are persisted as-is.
    PlainText,
    /// Values are serialised and encrypted; fails hard without encryption.
    Encrypted,
    /// Encrypted when possible, otherwise silently plain text.
    Lenient,
    /// Encrypted when possible, otherwise never persisted at all.
    Forgetful,
}

impl StoreMode {
    pub const ALL: [StoreMode; 4] = [
        Self::PlainText,
        Self::Encrypted,
        Self::Lenient,
        Self::Forgetful,
    ];
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainText => write!(f, "plain_text"),
            Self::Encrypted => write!(f, "encrypted"),
            Self::Lenient => write!(f, "lenient"),
            Self::Forgetful => write!(f, "forgetful"),
        }
    }
}

/// Which stores keep an in-memory cache of decoded values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCache {
    #[default]
    Both,
    PlainTextOnly,
    EncryptedOnly,
    Disabled,
}

impl MemoryCache {
    pub fn plain_text_enabled(&self) -> bool {
        matches!(self, Self::Both | Self::PlainTextOnly)
    }

    pub fn encrypted_enabled(&self) -> bool {
        matches!(self, Self::Both | Self::EncryptedOnly)
    }
}

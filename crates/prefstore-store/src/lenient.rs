use std::sync::Arc;

use prefstore_types::{TypeTag, Value};
use tracing::info;

use crate::changes::ChangeStream;
use crate::error::StoreResult;
use crate::traits::{KeyValueStore, TypedValue};

/// Encrypts when it can, stores plain text when it cannot.
///
/// The delegate is chosen once at construction and never changes.
pub struct LenientEncryptedStore {
    delegate: Arc<dyn KeyValueStore>,
    encrypted: bool,
}

impl LenientEncryptedStore {
    pub fn new(
        plain_text: Arc<dyn KeyValueStore>,
        encrypted: Arc<dyn KeyValueStore>,
        is_encryption_supported: bool,
    ) -> Self {
        let delegate = if is_encryption_supported {
            info!("lenient store will encrypt");
            encrypted
        } else {
            info!("encryption unavailable, lenient store falls back to plain text");
            plain_text
        };
        Self {
            delegate,
            encrypted: is_encryption_supported,
        }
    }

    /// Whether values end up in the encrypted store.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }
}

impl KeyValueStore for LenientEncryptedStore {
    fn save_value(&self, key: &str, value: Option<TypedValue>) -> StoreResult<()> {
        self.delegate.save_value(key, value)
    }

    fn get_value(&self, key: &str, tag: &TypeTag) -> StoreResult<Option<Value>> {
        self.delegate.get_value(key, tag)
    }

    fn has_value(&self, key: &str) -> bool {
        self.delegate.has_value(key)
    }

    fn delete_value(&self, key: &str) -> StoreResult<()> {
        self.delegate.delete_value(key)
    }

    fn observe_changes(&self) -> ChangeStream {
        self.delegate.observe_changes()
    }
}

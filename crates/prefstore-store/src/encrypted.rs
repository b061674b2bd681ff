use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use prefstore_crypto::EncryptionManager;
use prefstore_types::{TypeTag, Value};
use tracing::{debug, info, warn};

use crate::changes::ChangeStream;
use crate::error::{StoreError, StoreResult};
use crate::serialisation::SerialiserChain;
use crate::traits::{KeyValueStore, KeyValueStoreExt, TypedValue};

/// Store that serialises, then encrypts, every value before handing the
/// cipher text to a delegate store as a plain string.
///
/// The entry key is the encryption tag, so cipher text is only readable under
/// the key it was written to. The memory cache holds decrypted values.
///
/// Lock order: this store's lock is always taken before the delegate's.
pub struct EncryptedPreferenceStore {
    delegate: Arc<dyn KeyValueStore>,
    serialisers: SerialiserChain,
    encryption: Arc<dyn EncryptionManager>,
    is_encryption_supported: bool,
    memory_cache: bool,
    cache: Mutex<HashMap<String, TypedValue>>,
}

impl EncryptedPreferenceStore {
    /// Create a store with the memory cache enabled.
    ///
    /// The delegate only ever sees cipher text strings and should not cache.
    pub fn new(
        delegate: Arc<dyn KeyValueStore>,
        serialisers: SerialiserChain,
        encryption: Arc<dyn EncryptionManager>,
    ) -> Self {
        let is_encryption_supported = encryption.is_encryption_supported();
        info!(supported = is_encryption_supported, "encrypted store created");
        Self {
            delegate,
            serialisers,
            encryption,
            is_encryption_supported,
            memory_cache: true,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_memory_cache(mut self, enabled: bool) -> Self {
        self.memory_cache = enabled;
        self
    }

    /// Whether the encryption manager reported support at construction.
    pub fn is_encryption_supported(&self) -> bool {
        self.is_encryption_supported
    }

    pub fn is_memory_cache_enabled(&self) -> bool {
        self.memory_cache
    }

    /// Snapshot of the memory cache.
    pub fn cached_values(&self) -> HashMap<String, TypedValue> {
        self.cache.lock().expect("lock poisoned").clone()
    }

    fn ensure_supported(&self) -> StoreResult<()> {
        if self.is_encryption_supported {
            Ok(())
        } else {
            Err(StoreError::EncryptionUnavailable)
        }
    }

    fn decrypt_and_read(&self, key: &str, cipher_text: &str, tag: &TypeTag) -> StoreResult<Option<Value>> {
        let clear_text = self.encryption.decrypt(cipher_text, key)?;
        self.serialisers.deserialise(&clear_text, tag)
    }
}

impl KeyValueStore for EncryptedPreferenceStore {
    fn save_value(&self, key: &str, value: Option<TypedValue>) -> StoreResult<()> {
        let mut cache = self.cache.lock().expect("lock poisoned");
        let Some(typed) = value else {
            cache.remove(key);
            return self.delegate.delete_value(key);
        };
        self.ensure_supported()?;

        let serialised = self.serialisers.serialise(&typed.value, &typed.tag)?;
        let cipher_text = self.encryption.encrypt(&serialised, key)?;
        self.delegate.save_value(key, Some(TypedValue::string(cipher_text)))?;
        debug!(key, type_name = typed.tag.name(), "saved encrypted value");

        if self.memory_cache {
            cache.insert(key.to_string(), typed);
        }
        Ok(())
    }

    fn get_value(&self, key: &str, tag: &TypeTag) -> StoreResult<Option<Value>> {
        let mut cache = self.cache.lock().expect("lock poisoned");
        if self.memory_cache {
            if let Some(hit) = cache.get(key).filter(|hit| hit.tag == *tag) {
                return Ok(Some(hit.value.clone()));
            }
        }

        let Some(cipher_text) = self.delegate.get::<String>(key)? else {
            return Ok(None);
        };
        self.ensure_supported()?;

        match self.decrypt_and_read(key, &cipher_text, tag) {
            Ok(Some(value)) => {
                if self.memory_cache {
                    cache.insert(key.to_string(), TypedValue::new(*tag, value.clone()));
                }
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) if e.is_hard_failure() => Err(e),
            Err(e) => {
                warn!(key, type_name = tag.name(), error = %e, "encrypted read failed, returning default");
                Ok(None)
            }
        }
    }

    fn has_value(&self, key: &str) -> bool {
        self.delegate.has_value(key)
    }

    fn observe_changes(&self) -> ChangeStream {
        self.delegate.observe_changes()
    }
}

impl std::fmt::Debug for EncryptedPreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedPreferenceStore")
            .field("is_encryption_supported", &self.is_encryption_supported)
            .field("memory_cache", &self.memory_cache)
            .finish_non_exhaustive()
    }
}

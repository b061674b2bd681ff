use std::sync::Arc;

use prefstore_types::{TypeTag, Value};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::changes::ChangeStream;
use crate::error::StoreResult;
use crate::traits::{KeyValueStore, TypedValue};

/// Encrypts when it can and never persists anything when it cannot.
///
/// Without encryption every read is absent, every write and delete is a
/// no-op, `has_value` is `false` and the change stream ends immediately.
pub struct ForgetfulEncryptedStore {
    delegate: Option<Arc<dyn KeyValueStore>>,
}

impl ForgetfulEncryptedStore {
    pub fn new(encrypted: Arc<dyn KeyValueStore>, is_encryption_supported: bool) -> Self {
        let delegate = if is_encryption_supported {
            info!("forgetful store will encrypt");
            Some(encrypted)
        } else {
            info!("encryption unavailable, forgetful store will not persist");
            None
        };
        Self { delegate }
    }

    /// Whether values are persisted at all.
    pub fn is_persistent(&self) -> bool {
        self.delegate.is_some()
    }
}

impl KeyValueStore for ForgetfulEncryptedStore {
    fn save_value(&self, key: &str, value: Option<TypedValue>) -> StoreResult<()> {
        match &self.delegate {
            Some(delegate) => delegate.save_value(key, value),
            None => {
                debug!(key, "forgetting write");
                Ok(())
            }
        }
    }

    fn get_value(&self, key: &str, tag: &TypeTag) -> StoreResult<Option<Value>> {
        match &self.delegate {
            Some(delegate) => delegate.get_value(key, tag),
            None => Ok(None),
        }
    }

    fn has_value(&self, key: &str) -> bool {
        self.delegate.as_ref().is_some_and(|d| d.has_value(key))
    }

    fn delete_value(&self, key: &str) -> StoreResult<()> {
        match &self.delegate {
            Some(delegate) => delegate.delete_value(key),
            None => Ok(()),
        }
    }

    fn observe_changes(&self) -> ChangeStream {
        match &self.delegate {
            Some(delegate) => delegate.observe_changes(),
            None => {
                // Sender dropped at once: the stream ends without an event.
                let (_, rx) = broadcast::channel(1);
                rx
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use prefstore_crypto::{EncryptionKey, SealedEncryptionManager, UnavailableEncryptionManager};

    use super::*;
    use crate::encrypted::EncryptedPreferenceStore;
    use crate::preferences::InMemoryPreferences;
    use crate::serialisation::SerialiserChain;
    use crate::shared::SharedPreferenceStore;
    use crate::testing::{ChangeRecorder, RecordingStore};
    use crate::traits::KeyValueStoreExt;

    #[test]
    fn secret_scenario() {
        let prefs = Arc::new(InMemoryPreferences::new());
        let delegate = SharedPreferenceStore::new("encrypted_n", prefs.clone(), SerialiserChain::default())
            .with_memory_cache(false);
        let encrypted = EncryptedPreferenceStore::new(
            Arc::new(delegate),
            SerialiserChain::default(),
            Arc::new(UnavailableEncryptionManager::default()),
        );
        let supported = encrypted.is_encryption_supported();
        let store = ForgetfulEncryptedStore::new(Arc::new(encrypted), supported);
        let mut recorder = ChangeRecorder::new(store.observe_changes());

        store.save("secret", Some(&"x".to_string())).unwrap();
        assert_eq!(store.get::<String>("secret").unwrap(), None);
        assert!(!store.has_value("secret"));
        assert!(prefs.is_empty());
        assert!(recorder.drain().is_empty());
        assert!(recorder.is_closed());
    }

    #[test]
    fn never_touches_the_delegate_without_encryption() {
        let encrypted = Arc::new(RecordingStore::default());
        let store = ForgetfulEncryptedStore::new(encrypted.clone(), false);
        assert!(!store.is_persistent());

        store.save("k", Some(&1i32)).unwrap();
        store.delete("k").unwrap();
        assert_eq!(store.get::<i32>("k").unwrap(), None);
        assert!(!store.has_value("k"));
        assert_eq!(encrypted.calls(), 0);
    }

    #[test]
    fn behaves_like_the_encrypted_store_when_supported() {
        let prefs = Arc::new(InMemoryPreferences::new());
        let delegate = SharedPreferenceStore::new("encrypted_n", prefs.clone(), SerialiserChain::default())
            .with_memory_cache(false);
        let encrypted = Arc::new(EncryptedPreferenceStore::new(
            Arc::new(delegate),
            SerialiserChain::default(),
            Arc::new(SealedEncryptionManager::new(&EncryptionKey::generate())),
        ));
        let store = ForgetfulEncryptedStore::new(encrypted.clone(), true);
        assert!(store.is_persistent());

        store.save("secret", Some(&"x".to_string())).unwrap();
        assert_eq!(store.get::<String>("secret").unwrap(), Some("x".into()));
        // Same tag on both paths: the encrypted store reads it directly.
        assert_eq!(encrypted.get::<String>("secret").unwrap(), Some("x".into()));
        assert!(store.has_value("secret"));
    }
}

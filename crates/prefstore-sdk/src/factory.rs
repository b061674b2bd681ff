use std::sync::Arc;

use prefstore_crypto::{
    EncryptionKey, EncryptionManager, SealedEncryptionManager, UnavailableEncryptionManager,
};
use prefstore_store::{
    EncryptedPreferenceStore, FilePreferences, ForgetfulEncryptedStore, InMemoryPreferences,
    KeyValueStore, LenientEncryptedStore, Preferences, Serialiser, SerialiserChain,
    SharedPreferenceStore,
};
use prefstore_types::{validate_key, StoreMode, StoreValue};
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::entry::StoreEntry;
use crate::error::SdkResult;

/// Hands out [`StoreEntry`] handles bound to one of four stores.
///
/// The plain text and encrypted stores each own a namespace. The lenient and
/// forgetful stores delegate to them according to encryption support, which
/// is fixed when the factory is built.
pub struct StoreEntryFactory {
    plain_text: Arc<SharedPreferenceStore>,
    encrypted: Arc<EncryptedPreferenceStore>,
    lenient: Arc<LenientEncryptedStore>,
    forgetful: Arc<ForgetfulEncryptedStore>,
}

impl StoreEntryFactory {
    pub fn builder(config: StoreConfig) -> StoreEntryFactoryBuilder {
        StoreEntryFactoryBuilder::new(config)
    }

    /// Open a new entry for `key` in the store selected by `mode`.
    ///
    /// Entries are not cached; every call returns a fresh handle.
    pub fn open<C: StoreValue>(&self, key: &str, mode: StoreMode) -> SdkResult<StoreEntry<C>> {
        validate_key(key)?;
        Ok(StoreEntry::new(self.store(mode), key.to_string(), None))
    }

    /// Like [`open`](Self::open), with a value returned while the key is unset.
    pub fn open_with_default<C: StoreValue>(
        &self,
        key: &str,
        mode: StoreMode,
        default: C,
    ) -> SdkResult<StoreEntry<C>> {
        validate_key(key)?;
        Ok(StoreEntry::new(self.store(mode), key.to_string(), Some(default)))
    }

    /// The store behind `mode`.
    pub fn store(&self, mode: StoreMode) -> Arc<dyn KeyValueStore> {
        let store: Arc<dyn KeyValueStore> = match mode {
            StoreMode::PlainText => self.plain_text.clone(),
            StoreMode::Encrypted => self.encrypted.clone(),
            StoreMode::Lenient => self.lenient.clone(),
            StoreMode::Forgetful => self.forgetful.clone(),
        };
        store
    }

    pub fn plain_text_store(&self) -> &Arc<SharedPreferenceStore> {
        &self.plain_text
    }

    pub fn encrypted_store(&self) -> &Arc<EncryptedPreferenceStore> {
        &self.encrypted
    }

    pub fn is_encryption_supported(&self) -> bool {
        self.encrypted.is_encryption_supported()
    }
}

/// Builder for [`StoreEntryFactory`].
///
/// Anything not supplied is derived from the [`StoreConfig`]: preference
/// namespaces are file-backed when a directory is configured and in memory
/// otherwise, and the encryption manager is loaded from the configured key
/// file or reported unavailable.
pub struct StoreEntryFactoryBuilder {
    config: StoreConfig,
    custom_serialiser: Option<Arc<dyn Serialiser>>,
    encryption_manager: Option<Arc<dyn EncryptionManager>>,
    plain_text_preferences: Option<Arc<dyn Preferences>>,
    encrypted_preferences: Option<Arc<dyn Preferences>>,
}

impl StoreEntryFactoryBuilder {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            custom_serialiser: None,
            encryption_manager: None,
            plain_text_preferences: None,
            encrypted_preferences: None,
        }
    }

    /// Serialiser consulted before the built-in fallback codec.
    pub fn custom_serialiser(mut self, serialiser: Arc<dyn Serialiser>) -> Self {
        self.custom_serialiser = Some(serialiser);
        self
    }

    pub fn encryption_manager(mut self, manager: Arc<dyn EncryptionManager>) -> Self {
        self.encryption_manager = Some(manager);
        self
    }

    pub fn plain_text_preferences(mut self, preferences: Arc<dyn Preferences>) -> Self {
        self.plain_text_preferences = Some(preferences);
        self
    }

    pub fn encrypted_preferences(mut self, preferences: Arc<dyn Preferences>) -> Self {
        self.encrypted_preferences = Some(preferences);
        self
    }

    pub fn build(self) -> SdkResult<StoreEntryFactory> {
        let config = self.config;
        let plain_name = config.plain_text_namespace()?;
        let encrypted_name = config.encrypted_namespace()?;

        let plain_prefs = match self.plain_text_preferences {
            Some(prefs) => prefs,
            None => open_preferences(&config, &plain_name)?,
        };
        let encrypted_prefs = match self.encrypted_preferences {
            Some(prefs) => prefs,
            None => open_preferences(&config, &encrypted_name)?,
        };
        let encryption = match self.encryption_manager {
            Some(manager) => manager,
            None => resolve_encryption(&config),
        };
        let serialisers = SerialiserChain::new(self.custom_serialiser);

        let plain_text = Arc::new(
            SharedPreferenceStore::new(plain_name.clone(), plain_prefs, serialisers.clone())
                .with_memory_cache(config.memory_cache.plain_text_enabled())
                .with_change_capacity(config.change_capacity),
        );
        // Holds cipher text only, so it never caches.
        let cipher_store =
            SharedPreferenceStore::new(encrypted_name, encrypted_prefs, serialisers.clone())
                .with_memory_cache(false)
                .with_change_capacity(config.change_capacity);
        let encrypted = Arc::new(
            EncryptedPreferenceStore::new(Arc::new(cipher_store), serialisers, encryption)
                .with_memory_cache(config.memory_cache.encrypted_enabled()),
        );

        let supported = encrypted.is_encryption_supported();
        let lenient = Arc::new(LenientEncryptedStore::new(
            plain_text.clone(),
            encrypted.clone(),
            supported,
        ));
        let forgetful = Arc::new(ForgetfulEncryptedStore::new(encrypted.clone(), supported));

        info!(
            app_id = %config.app_id,
            namespace = %plain_name,
            encryption_supported = supported,
            memory_cache = ?config.memory_cache,
            file_backed = config.directory.is_some(),
            "store entry factory ready"
        );

        Ok(StoreEntryFactory {
            plain_text,
            encrypted,
            lenient,
            forgetful,
        })
    }
}

fn open_preferences(config: &StoreConfig, namespace: &str) -> SdkResult<Arc<dyn Preferences>> {
    let preferences: Arc<dyn Preferences> = match &config.directory {
        Some(dir) => Arc::new(FilePreferences::open_namespace(dir, namespace)?),
        None => Arc::new(InMemoryPreferences::new()),
    };
    Ok(preferences)
}

fn resolve_encryption(config: &StoreConfig) -> Arc<dyn EncryptionManager> {
    let Some(path) = &config.key_file else {
        return Arc::new(UnavailableEncryptionManager::default());
    };
    let manager: Arc<dyn EncryptionManager> = match EncryptionKey::load_or_generate(path) {
        Ok(key) => Arc::new(SealedEncryptionManager::new(&key)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "encryption key unavailable");
            Arc::new(UnavailableEncryptionManager::new(e.to_string()))
        }
    };
    manager
}

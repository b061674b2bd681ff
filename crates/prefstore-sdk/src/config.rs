use std::path::{Path, PathBuf};

use prefstore_store::changes::DEFAULT_CAPACITY;
use prefstore_types::{store_name, MemoryCache};
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Logical name of the preference namespace when none is configured.
pub const DEFAULT_PREFERENCES_NAME: &str = "shared_preference_store";

/// Prefix of the namespace that holds encrypted values.
pub const ENCRYPTED_PREFIX: &str = "encrypted_";

/// Configuration of a [`StoreEntryFactory`](crate::StoreEntryFactory).
///
/// Every field has a default, so a TOML file only needs the values it
/// changes:
///
/// ```toml
/// app_id = "com.example.notes"
/// directory = "/var/lib/notes/prefs"
/// key_file = "/var/lib/notes/store.key"
/// memory_cache = "plain_text_only"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Application identifier prefixed to every namespace name.
    pub app_id: String,
    pub preferences_name: String,
    /// Directory of the file-backed namespaces; in memory when unset.
    pub directory: Option<PathBuf>,
    pub memory_cache: MemoryCache,
    /// Hex key file, created on first use. Without one, encryption is
    /// unavailable unless a manager is given to the builder.
    pub key_file: Option<PathBuf>,
    /// Change events buffered per subscriber.
    pub change_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            app_id: "prefstore".into(),
            preferences_name: DEFAULT_PREFERENCES_NAME.into(),
            directory: None,
            memory_cache: MemoryCache::default(),
            key_file: None,
            change_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl StoreConfig {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string_pretty(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Namespace of the plain text store.
    pub fn plain_text_namespace(&self) -> SdkResult<String> {
        Ok(store_name(&self.app_id, &self.preferences_name)?)
    }

    /// Namespace of the encrypted store.
    pub fn encrypted_namespace(&self) -> SdkResult<String> {
        let name = format!("{ENCRYPTED_PREFIX}{}", self.preferences_name);
        Ok(store_name(&self.app_id, &name)?)
    }
}

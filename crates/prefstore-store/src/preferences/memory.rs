use std::collections::BTreeMap;
use std::sync::RwLock;

use prefstore_types::RawValue;

use crate::error::PreferencesResult;
use crate::preferences::{apply_changes, Change, Preferences};

/// In-memory, BTreeMap-based preferences.
///
/// Intended for tests and embedding. All entries are held in memory behind a
/// `RwLock` for safe concurrent access. Values are cloned on read.
pub struct InMemoryPreferences {
    entries: RwLock<BTreeMap<String, RawValue>>,
}

impl InMemoryPreferences {
    /// Create a new, empty instance.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryPreferences {
    fn default() -> Self {
        Self::new()
    }
}

impl Preferences for InMemoryPreferences {
    fn contains(&self, key: &str) -> bool {
        self.entries.read().expect("lock poisoned").contains_key(key)
    }

    fn get(&self, key: &str) -> Option<RawValue> {
        self.entries.read().expect("lock poisoned").get(key).cloned()
    }

    fn all(&self) -> BTreeMap<String, RawValue> {
        self.entries.read().expect("lock poisoned").clone()
    }

    fn commit(&self, changes: Vec<Change>) -> PreferencesResult<()> {
        let mut entries = self.entries.write().expect("lock poisoned");
        apply_changes(&mut entries, changes);
        Ok(())
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use prefstore_types::RawValue;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{PreferencesError, PreferencesResult};
use crate::preferences::{apply_changes, Change, Preferences};

/// File extension of persisted namespaces.
pub const FILE_EXTENSION: &str = "json";

/// Preferences persisted as one JSON document per namespace.
///
/// The whole map is held in memory and written out on every commit. Writes go
/// to a temporary file in the same directory which then replaces the
/// document, so a crash never leaves a half-written namespace behind.
pub struct FilePreferences {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, RawValue>>,
}

impl FilePreferences {
    /// Open (or create) the document at `path`.
    ///
    /// A missing file is an empty namespace; it is only created on the first
    /// commit.
    pub fn open(path: impl Into<PathBuf>) -> PreferencesResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let bytes = fs::read(&path)?;
            let entries: BTreeMap<String, RawValue> = serde_json::from_slice(&bytes)
                .map_err(|e| PreferencesError::Format(format!("{}: {e}", path.display())))?;
            debug!(path = %path.display(), entries = entries.len(), "loaded preferences");
            entries
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Open the namespace `name` inside `directory`.
    pub fn open_namespace(directory: &Path, name: &str) -> PreferencesResult<Self> {
        Self::open(directory.join(format!("{name}.{FILE_EXTENSION}")))
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, RawValue>) -> PreferencesResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| PreferencesError::Format(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Preferences for FilePreferences {
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
        let mut next = entries.clone();
        let count = changes.len();
        apply_changes(&mut next, changes);

        // The in-memory map only moves once the document is on disk.
        self.persist(&next)?;
        *entries = next;
        info!(path = %self.path.display(), changes = count, "committed preferences");
        Ok(())
    }
}

impl std::fmt::Debug for FilePreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePreferences")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

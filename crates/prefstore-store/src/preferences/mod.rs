//! Backing preference storage.
//!
//! [`Preferences`] is the persistent primitive map every base store wraps. It
//! offers presence checks, typed getters with defaults, enumeration, and an
//! [`Editor`] whose changes are committed atomically on [`Editor::apply`].
//!
//! - [`InMemoryPreferences`] -- `BTreeMap` behind a `RwLock`, for tests and
//!   ephemeral use
//! - [`FilePreferences`] -- one JSON document per namespace, replaced
//!   atomically on every commit

mod file;
mod memory;

use std::collections::BTreeMap;

use prefstore_types::{RawValue, ValueKind};

use crate::error::{PreferencesError, PreferencesResult};

pub use file::FilePreferences;
pub use memory::InMemoryPreferences;

/// A single pending change.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    Put { key: String, value: RawValue },
    Remove { key: String },
}

impl Change {
    pub fn key(&self) -> &str {
        match self {
            Self::Put { key, .. } | Self::Remove { key } => key,
        }
    }
}

/// Persistent map of keys to primitives.
///
/// Implementations must satisfy these invariants:
/// - `commit` applies all of its changes or none of them.
/// - Changes are applied in order; a later change to a key wins.
/// - Reads after a successful `commit` observe its changes.
pub trait Preferences: Send + Sync {
    /// Whether a value is stored under `key`.
    fn contains(&self, key: &str) -> bool;

    /// The raw value stored under `key`.
    fn get(&self, key: &str) -> Option<RawValue>;

    /// Snapshot of every stored entry, for diagnostics and enumeration.
    fn all(&self) -> BTreeMap<String, RawValue>;

    /// Atomically apply `changes`.
    fn commit(&self, changes: Vec<Change>) -> PreferencesResult<()>;

    fn get_string(&self, key: &str, default: Option<String>) -> PreferencesResult<Option<String>> {
        match self.get(key) {
            None => Ok(default),
            Some(RawValue::String(v)) => Ok(Some(v)),
            Some(other) => Err(mismatch(key, ValueKind::String, &other)),
        }
    }

    fn get_boolean(&self, key: &str, default: bool) -> PreferencesResult<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(RawValue::Boolean(v)) => Ok(v),
            Some(other) => Err(mismatch(key, ValueKind::Boolean, &other)),
        }
    }

    fn get_int(&self, key: &str, default: i32) -> PreferencesResult<i32> {
        match self.get(key) {
            None => Ok(default),
            Some(RawValue::Int(v)) => Ok(v),
            Some(other) => Err(mismatch(key, ValueKind::Int, &other)),
        }
    }

    fn get_long(&self, key: &str, default: i64) -> PreferencesResult<i64> {
        match self.get(key) {
            None => Ok(default),
            Some(RawValue::Long(v)) => Ok(v),
            Some(other) => Err(mismatch(key, ValueKind::Long, &other)),
        }
    }

    fn get_float(&self, key: &str, default: f32) -> PreferencesResult<f32> {
        match self.get(key) {
            None => Ok(default),
            Some(RawValue::Float(v)) => Ok(v),
            Some(other) => Err(mismatch(key, ValueKind::Float, &other)),
        }
    }
}

impl dyn Preferences {
    /// Start a batch of changes.
    pub fn edit(&self) -> Editor<'_> {
        Editor {
            preferences: self,
            changes: Vec::new(),
        }
    }
}

fn mismatch(key: &str, expected: ValueKind, found: &RawValue) -> PreferencesError {
    PreferencesError::TypeMismatch {
        key: key.to_string(),
        expected,
        found: found.kind(),
    }
}

/// Batch of changes committed together by [`Editor::apply`].
#[must_use = "changes are only persisted by `apply`"]
pub struct Editor<'a> {
    preferences: &'a dyn Preferences,
    changes: Vec<Change>,
}

impl Editor<'_> {
    pub fn put(mut self, key: &str, value: RawValue) -> Self {
        self.changes.push(Change::Put {
            key: key.to_string(),
            value,
        });
        self
    }

    pub fn put_string(self, key: &str, value: impl Into<String>) -> Self {
        self.put(key, RawValue::String(value.into()))
    }

    pub fn put_boolean(self, key: &str, value: bool) -> Self {
        self.put(key, RawValue::Boolean(value))
    }

    pub fn put_int(self, key: &str, value: i32) -> Self {
        self.put(key, RawValue::Int(value))
    }

    pub fn put_long(self, key: &str, value: i64) -> Self {
        self.put(key, RawValue::Long(value))
    }

    pub fn put_float(self, key: &str, value: f32) -> Self {
        self.put(key, RawValue::Float(value))
    }

    pub fn remove(mut self, key: &str) -> Self {
        self.changes.push(Change::Remove {
            key: key.to_string(),
        });
        self
    }

    /// Commit every queued change.
    pub fn apply(self) -> PreferencesResult<()> {
        if self.changes.is_empty() {
            return Ok(());
        }
        self.preferences.commit(self.changes)
    }
}

/// Apply `changes` to an in-memory map, in order.
pub(crate) fn apply_changes(entries: &mut BTreeMap<String, RawValue>, changes: Vec<Change>) {
    for change in changes {
        match change {
            Change::Put { key, value } => {
                entries.insert(key, value);
            }
            Change::Remove { key } => {
                entries.remove(&key);
            }
        }
    }
}

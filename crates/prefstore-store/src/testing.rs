//! Test doubles shared by the store tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use prefstore_types::{RawValue, TypeTag, Value};
use tokio::sync::broadcast::error::TryRecvError;

use crate::changes::{ChangeEmitter, ChangeStream};
use crate::error::{PreferencesError, PreferencesResult, StoreResult};
use crate::preferences::{Change, Preferences};
use crate::traits::{KeyValueStore, TypedValue};

/// Preferences whose every commit fails.
#[derive(Default)]
pub(crate) struct FailingPreferences;

impl Preferences for FailingPreferences {
    fn contains(&self, _key: &str) -> bool {
        false
    }

    fn get(&self, _key: &str) -> Option<RawValue> {
        None
    }

    fn all(&self) -> BTreeMap<String, RawValue> {
        BTreeMap::new()
    }

    fn commit(&self, _changes: Vec<Change>) -> PreferencesResult<()> {
        Err(PreferencesError::Io(std::io::Error::other("disk full")))
    }
}

/// Store that only counts calls and answers with nothing.
#[derive(Default)]
pub(crate) struct RecordingStore {
    pub saves: AtomicUsize,
    pub gets: AtomicUsize,
    pub has: AtomicUsize,
    pub changes: ChangeEmitter,
}

impl RecordingStore {
    pub fn calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst) + self.gets.load(Ordering::SeqCst) + self.has.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for RecordingStore {
    fn save_value(&self, key: &str, _value: Option<TypedValue>) -> StoreResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.changes.emit(key);
        Ok(())
    }

    fn get_value(&self, _key: &str, _tag: &TypeTag) -> StoreResult<Option<Value>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }

    fn has_value(&self, _key: &str) -> bool {
        self.has.fetch_add(1, Ordering::SeqCst);
        false
    }

    fn observe_changes(&self) -> ChangeStream {
        self.changes.subscribe()
    }
}

/// Collects whatever a change stream has buffered.
pub(crate) struct ChangeRecorder {
    rx: ChangeStream,
}

impl ChangeRecorder {
    pub fn new(rx: ChangeStream) -> Self {
        Self { rx }
    }

    pub fn drain(&mut self) -> Vec<String> {
        let mut keys = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(key) => keys.push(key),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return keys,
            }
        }
    }

    /// Whether the stream has ended.
    pub fn is_closed(&mut self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Closed))
    }
}

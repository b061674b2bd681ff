use std::sync::Arc;

use prefstore_store::{KeyValueStore, KeyValueStoreExt};
use prefstore_types::StoreValue;
use tokio::runtime::Handle;
use tracing::debug;

use crate::error::SdkResult;
use crate::observe::{EntryChange, Observation, Subscription};

/// A typed handle on one key of one store.
///
/// Entries hold no state beyond the binding; two entries for the same key and
/// store see the same value.
pub struct StoreEntry<C: StoreValue> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    default: Option<C>,
}

impl<C: StoreValue> StoreEntry<C> {
    pub(crate) fn new(store: Arc<dyn KeyValueStore>, key: String, default: Option<C>) -> Self {
        Self {
            store,
            key,
            default,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored value, or the entry's default.
    pub fn get(&self) -> SdkResult<Option<C>> {
        Ok(self.store.get::<C>(&self.key)?.or_else(|| self.default.clone()))
    }

    /// The stored value, or `default`.
    pub fn get_or(&self, default: C) -> SdkResult<C> {
        Ok(self.store.get_or(&self.key, default)?)
    }

    /// Read the same key as another type.
    ///
    /// Returns `None` when the stored value is not an `S`.
    pub fn get_as<S: StoreValue>(&self) -> SdkResult<Option<S>> {
        Ok(self.store.get::<S>(&self.key)?)
    }

    /// Save `value`, or delete the key when it is `None`.
    pub fn save(&self, value: Option<C>) -> SdkResult<()> {
        debug!(key = %self.key, delete = value.is_none(), "saving entry");
        Ok(self.store.save(&self.key, value.as_ref())?)
    }

    pub fn delete(&self) -> SdkResult<()> {
        Ok(self.store.delete(&self.key)?)
    }

    /// Whether the backing storage holds a value for this key.
    pub fn exists(&self) -> bool {
        self.store.has_value(&self.key)
    }

    /// Observe changes to this key, pulled by the caller.
    ///
    /// With `emit_current`, the first item is the value at subscription time.
    pub fn observe(&self, emit_current: bool) -> Observation<C> {
        Observation::new(self.clone(), self.store.observe_changes(), emit_current)
    }

    /// Deliver changes to this key to `callback` on `runtime`.
    ///
    /// Delivery stops when the returned [`Subscription`] is disposed or
    /// dropped.
    pub fn observe_on<F>(&self, emit_current: bool, runtime: &Handle, mut callback: F) -> Subscription
    where
        F: FnMut(EntryChange<C>) + Send + 'static,
    {
        let mut observation = self.observe(emit_current);
        let task = runtime.spawn(async move {
            while let Some(change) = observation.next().await {
                callback(change);
            }
        });
        Subscription::new(task)
    }
}

impl<C: StoreValue> Clone for StoreEntry<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            default: self.default.clone(),
        }
    }
}

impl<C: StoreValue + std::fmt::Debug> std::fmt::Debug for StoreEntry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreEntry")
            .field("key", &self.key)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

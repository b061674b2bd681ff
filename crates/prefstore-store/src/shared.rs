use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use prefstore_types::{RawValue, TypeTag, Value, ValueKind};
use tracing::{debug, warn};

use crate::changes::{ChangeEmitter, ChangeStream};
use crate::error::StoreResult;
use crate::preferences::Preferences;
use crate::serialisation::SerialiserChain;
use crate::traits::{KeyValueStore, TypedValue};

/// Base store over a [`Preferences`] namespace.
///
/// Primitives are written natively; every other value goes through the
/// serialiser chain and is stored as a string. Reads are served from the
/// memory cache when it holds the key under the requested type.
///
/// One lock covers the cache and the storage access of each operation, so a
/// read that populates the cache can never interleave with a write.
pub struct SharedPreferenceStore {
    name: String,
    preferences: Arc<dyn Preferences>,
    serialisers: SerialiserChain,
    changes: ChangeEmitter,
    memory_cache: bool,
    cache: Mutex<HashMap<String, TypedValue>>,
}

impl SharedPreferenceStore {
    /// Create a store with the memory cache enabled.
    pub fn new(
        name: impl Into<String>,
        preferences: Arc<dyn Preferences>,
        serialisers: SerialiserChain,
    ) -> Self {
        Self {
            name: name.into(),
            preferences,
            serialisers,
            changes: ChangeEmitter::default(),
            memory_cache: true,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_memory_cache(mut self, enabled: bool) -> Self {
        self.memory_cache = enabled;
        self
    }

    /// Buffer up to `capacity` change events per subscriber.
    pub fn with_change_capacity(mut self, capacity: usize) -> Self {
        self.changes = ChangeEmitter::new(capacity);
        self
    }

    /// Namespace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backing storage, for diagnostics.
    pub fn preferences(&self) -> &Arc<dyn Preferences> {
        &self.preferences
    }

    pub fn is_memory_cache_enabled(&self) -> bool {
        self.memory_cache
    }

    /// Snapshot of the memory cache.
    pub fn cached_values(&self) -> HashMap<String, TypedValue> {
        self.cache.lock().expect("lock poisoned").clone()
    }

    fn delete_locked(&self, cache: &mut HashMap<String, TypedValue>, key: &str) -> StoreResult<()> {
        let existed = self.preferences.contains(key);
        if existed {
            self.preferences.edit().remove(key).apply()?;
        }
        cache.remove(key);

        if existed {
            debug!(store = %self.name, key, "deleted value");
            self.changes.emit(key);
        }
        Ok(())
    }

    fn read(&self, key: &str, tag: &TypeTag) -> StoreResult<Option<Value>> {
        let prefs = &self.preferences;
        let value = match tag.kind() {
            ValueKind::Boolean => Some(Value::Boolean(prefs.get_boolean(key, false)?)),
            ValueKind::Float => Some(Value::Float(prefs.get_float(key, 0.0)?)),
            ValueKind::Long => Some(Value::Long(prefs.get_long(key, 0)?)),
            ValueKind::Int => Some(Value::Int(prefs.get_int(key, 0)?)),
            ValueKind::String => prefs.get_string(key, None)?.map(Value::String),
            ValueKind::Object => match prefs.get_string(key, None)? {
                Some(serialised) => self.serialisers.deserialise(&serialised, tag)?,
                None => None,
            },
        };
        Ok(value)
    }
}

impl KeyValueStore for SharedPreferenceStore {
    fn save_value(&self, key: &str, value: Option<TypedValue>) -> StoreResult<()> {
        let mut cache = self.cache.lock().expect("lock poisoned");
        let Some(typed) = value else {
            return self.delete_locked(&mut cache, key);
        };

        let raw = match typed.value.clone().into_raw() {
            Some(raw) => raw,
            None => RawValue::String(self.serialisers.serialise(&typed.value, &typed.tag)?),
        };
        self.preferences.edit().put(key, raw).apply()?;
        debug!(store = %self.name, key, kind = %typed.value.kind(), "saved value");

        if self.memory_cache {
            cache.insert(key.to_string(), typed);
        } else {
            cache.remove(key);
        }
        self.changes.emit(key);
        Ok(())
    }

    fn get_value(&self, key: &str, tag: &TypeTag) -> StoreResult<Option<Value>> {
        let mut cache = self.cache.lock().expect("lock poisoned");
        if self.memory_cache {
            if let Some(hit) = cache.get(key).filter(|hit| hit.tag == *tag) {
                return Ok(Some(hit.value.clone()));
            }
        }
        if !self.preferences.contains(key) {
            return Ok(None);
        }

        match self.read(key, tag) {
            Ok(Some(value)) => {
                if self.memory_cache {
                    cache.insert(key.to_string(), TypedValue::new(*tag, value.clone()));
                }
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(store = %self.name, key, type_name = tag.name(), error = %e, "read failed, returning default");
                Ok(None)
            }
        }
    }

    fn has_value(&self, key: &str) -> bool {
        self.preferences.contains(key)
    }

    fn observe_changes(&self) -> ChangeStream {
        self.changes.subscribe()
    }
}

impl std::fmt::Debug for SharedPreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPreferenceStore")
            .field("name", &self.name)
            .field("memory_cache", &self.memory_cache)
            .field("serialisers", &self.serialisers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use prefstore_types::{Serialisable, StoreValue};
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::error::StoreError;
    use crate::preferences::InMemoryPreferences;
    use crate::serialisation::{JsonSerialiser, PREFIX};
    use crate::testing::{FailingPreferences, ChangeRecorder};
    use crate::traits::KeyValueStoreExt;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
        age: u32,
    }

    impl Serialisable for Person {}

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Token(String);

    prefstore_types::store_value!(Token);

    fn store() -> (Arc<InMemoryPreferences>, SharedPreferenceStore) {
        let prefs = Arc::new(InMemoryPreferences::new());
        let store = SharedPreferenceStore::new("test", prefs.clone(), SerialiserChain::default());
        (prefs, store)
    }

    #[test]
    fn primitives_are_stored_natively() {
        let (prefs, store) = store();
        store.save("b", Some(&true)).unwrap();
        store.save("f", Some(&1.5f32)).unwrap();
        store.save("l", Some(&7i64)).unwrap();
        store.save("i", Some(&30i32)).unwrap();
        store.save("s", Some(&"Smith".to_string())).unwrap();

        assert_eq!(prefs.get("b"), Some(RawValue::Boolean(true)));
        assert_eq!(prefs.get("f"), Some(RawValue::Float(1.5)));
        assert_eq!(prefs.get("l"), Some(RawValue::Long(7)));
        assert_eq!(prefs.get("i"), Some(RawValue::Int(30)));
        assert_eq!(prefs.get("s"), Some(RawValue::String("Smith".into())));
    }

    #[test]
    fn collections_of_primitives_use_the_fallback_codec() {
        let (prefs, store) = store();
        let tags = vec!["rust".to_string(), "prefs".to_string()];
        store.save("tags", Some(&tags)).unwrap();

        match prefs.get("tags") {
            Some(RawValue::String(s)) => assert!(s.starts_with(&format!("{PREFIX}Vec<String>"))),
            other => panic!("expected a serialised string, got {other:?}"),
        }
        let cold = SharedPreferenceStore::new("test", prefs, SerialiserChain::default());
        assert_eq!(cold.get::<Vec<String>>("tags").unwrap(), Some(tags));
        assert_eq!(cold.get::<Vec<i32>>("tags").unwrap(), None);
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Reading {
        celsius: f32,
    }

    impl Serialisable for Reading {}

    #[test]
    fn lossy_object_is_neither_stored_nor_cached() {
        let (prefs, store) = store();
        let mut recorder = ChangeRecorder::new(store.observe_changes());
        store.save("r", Some(&Reading { celsius: f32::NAN })).unwrap();

        assert!(!prefs.contains("r"));
        assert!(store.cached_values().is_empty());
        assert_eq!(store.get::<Reading>("r").unwrap(), None);
        assert!(recorder.drain().is_empty());
    }

    #[test]
    fn age_scenario() {
        let (prefs, store) = store();
        let mut rx = store.observe_changes();

        store.save("age", Some(&30i32)).unwrap();
        assert_eq!(prefs.get("age"), Some(RawValue::Int(30)));
        assert_eq!(store.get::<i32>("age").unwrap(), Some(30));
        assert_eq!(rx.try_recv().unwrap(), "age");
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn objects_go_through_the_fallback_codec() {
        let (prefs, store) = store();
        let person = Person {
            name: "Smith".into(),
            age: 30,
        };
        store.save("person", Some(&person)).unwrap();

        match prefs.get("person") {
            Some(RawValue::String(s)) => assert!(s.starts_with(PREFIX)),
            other => panic!("expected serialised string, got {other:?}"),
        }
        assert_eq!(store.get::<Person>("person").unwrap(), Some(person));
    }

    #[test]
    fn read_through_cache_after_restart() {
        let prefs = Arc::new(InMemoryPreferences::new());
        let person = Person {
            name: "Smith".into(),
            age: 30,
        };
        SharedPreferenceStore::new("a", prefs.clone(), SerialiserChain::default())
            .save("person", Some(&person))
            .unwrap();

        let fresh = SharedPreferenceStore::new("a", prefs.clone(), SerialiserChain::default());
        assert!(fresh.cached_values().is_empty());
        assert_eq!(fresh.get::<Person>("person").unwrap(), Some(person.clone()));
        assert_eq!(fresh.cached_values()["person"].value, person.to_value().unwrap());
    }

    #[test]
    fn cache_hit_skips_storage() {
        let (prefs, store) = store();
        store.save("k", Some(&1i32)).unwrap();

        // Bypass the store: only the cache still has the old value.
        prefs.clear();
        assert_eq!(store.get::<i32>("k").unwrap(), Some(1));
    }

    #[test]
    fn disabled_cache_always_reads_storage() {
        let prefs = Arc::new(InMemoryPreferences::new());
        let store = SharedPreferenceStore::new("n", prefs.clone(), SerialiserChain::default())
            .with_memory_cache(false);
        store.save("k", Some(&1i32)).unwrap();
        assert!(store.cached_values().is_empty());

        prefs.clear();
        assert_eq!(store.get::<i32>("k").unwrap(), None);
    }

    #[test]
    fn cache_matches_storage_after_every_operation() {
        let (prefs, store) = store();
        let check = |store: &SharedPreferenceStore| {
            for (key, cached) in store.cached_values() {
                let raw = prefs.get(&key).expect("cached key must be stored");
                match cached.value.clone().into_raw() {
                    Some(expected) => assert_eq!(raw, expected),
                    None => assert!(matches!(raw, RawValue::String(_))),
                }
            }
        };

        store.save("a", Some(&1i32)).unwrap();
        check(&store);
        store.save("a", Some(&2i32)).unwrap();
        check(&store);
        assert_eq!(store.get::<i32>("a").unwrap(), Some(2));
        check(&store);
        store.delete("a").unwrap();
        check(&store);
        assert!(store.cached_values().is_empty());
    }

    #[test]
    fn wrong_kind_reads_as_absent() {
        let (_prefs, store) = store();
        store.save("age", Some(&"thirty".to_string())).unwrap();
        assert_eq!(store.get::<i32>("age").unwrap(), None);
        assert_eq!(store.get_or::<i32>("age", 5).unwrap(), 5);
    }

    #[test]
    fn corrupt_serialised_data_reads_as_absent() {
        let (prefs, store) = store();
        let p: &dyn Preferences = &*prefs;
        p.edit()
            .put_string("person", format!("{PREFIX}garbage"))
            .apply()
            .unwrap();
        assert_eq!(store.get::<Person>("person").unwrap(), None);
        assert!(store.cached_values().is_empty());
    }

    #[test]
    fn unsupported_type_is_a_hard_failure() {
        let (prefs, store) = store();
        let mut rx = store.observe_changes();
        let err = store.save("token", Some(&Token("t".into()))).unwrap_err();

        assert!(matches!(err, StoreError::UnsupportedType { .. }));
        assert!(!prefs.contains("token"));
        assert!(store.cached_values().is_empty());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn custom_serialiser_is_preferred() {
        let prefs = Arc::new(InMemoryPreferences::new());
        let store = SharedPreferenceStore::new(
            "c",
            prefs.clone(),
            SerialiserChain::new(Some(Arc::new(JsonSerialiser))),
        );
        store.save("token", Some(&Token("t".into()))).unwrap();
        assert_eq!(prefs.get("token"), Some(RawValue::String("\"t\"".into())));
        assert_eq!(store.get::<Token>("token").unwrap(), Some(Token("t".into())));
    }

    #[test]
    fn delete_semantics() {
        let (prefs, store) = store();
        let mut rx = store.observe_changes();

        store.delete("missing").unwrap();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        store.save("k", Some(&1i32)).unwrap();
        store.save::<i32>("k", None).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "k");
        assert_eq!(rx.try_recv().unwrap(), "k");
        assert!(!prefs.contains("k"));
        assert!(!store.has_value("k"));
        assert_eq!(store.get::<i32>("k").unwrap(), None);
    }

    #[test]
    fn failed_commit_is_swallowed_without_side_effects() {
        let prefs = Arc::new(FailingPreferences::default());
        let store = SharedPreferenceStore::new("f", prefs.clone(), SerialiserChain::default());
        let mut rx = store.observe_changes();

        assert!(store.save("k", Some(&1i32)).is_ok());
        assert!(store.save_value("k", Some(TypedValue::string("v"))).is_err());
        assert!(store.cached_values().is_empty());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn one_event_per_write() {
        let (_prefs, store) = store();
        let mut recorder = ChangeRecorder::new(store.observe_changes());
        for i in 0..5i32 {
            store.save("k", Some(&i)).unwrap();
        }
        store.save("other", Some(&true)).unwrap();
        assert_eq!(recorder.drain(), vec!["k", "k", "k", "k", "k", "other"]);
    }

    proptest! {
        #[test]
        fn primitives_roundtrip_through_a_cold_store(
            b in any::<bool>(),
            f in proptest::num::f32::ANY,
            l in any::<i64>(),
            i in any::<i32>(),
            s in any::<String>(),
        ) {
            let prefs = Arc::new(InMemoryPreferences::new());
            let warm = SharedPreferenceStore::new("p", prefs.clone(), SerialiserChain::default());
            warm.save("b", Some(&b)).unwrap();
            warm.save("f", Some(&f)).unwrap();
            warm.save("l", Some(&l)).unwrap();
            warm.save("i", Some(&i)).unwrap();
            warm.save("s", Some(&s)).unwrap();

            let cold = SharedPreferenceStore::new("p", prefs, SerialiserChain::default());
            prop_assert_eq!(cold.get::<bool>("b").unwrap(), Some(b));
            let back = cold.get::<f32>("f").unwrap().unwrap();
            prop_assert!(back.to_bits() == f.to_bits() || (back.is_nan() && f.is_nan()));
            prop_assert_eq!(cold.get::<i64>("l").unwrap(), Some(l));
            prop_assert_eq!(cold.get::<i32>("i").unwrap(), Some(i));
            prop_assert_eq!(cold.get::<String>("s").unwrap(), Some(s));
        }
    }
}

use prefstore_types::{StoreValue, TypeError, TypeTag, Value};
use tracing::warn;

use crate::changes::ChangeStream;
use crate::error::{settle_write, StoreError, StoreResult};

/// A value paired with the descriptor of the type it was saved as.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedValue {
    pub tag: TypeTag,
    pub value: Value,
}

impl TypedValue {
    pub fn new(tag: TypeTag, value: Value) -> Self {
        Self { tag, value }
    }

    /// Erase a typed value.
    pub fn of<V: StoreValue>(value: &V) -> Result<Self, TypeError> {
        Ok(Self {
            tag: V::type_tag(),
            value: value.to_value()?,
        })
    }

    /// A plain string value.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            tag: String::type_tag(),
            value: Value::String(value.into()),
        }
    }
}

/// Typed key-value store.
///
/// All implementations must satisfy these invariants:
/// - When a memory cache is enabled, its entry for a key is either absent or
///   equal to what the backing storage would return for that key.
/// - A successful write or a delete of an existing key emits exactly one
///   change event carrying the key; failed writes emit nothing.
/// - Reads never propagate corrupt or foreign data as an error: they log it
///   and return `Ok(None)`. The only read error is
///   [`StoreError::EncryptionUnavailable`].
/// - `save_value` returns every failure; [`KeyValueStoreExt`] decides which
///   of them reach the caller.
pub trait KeyValueStore: Send + Sync {
    /// Persist `value` under `key`, or delete the key when `value` is `None`.
    fn save_value(&self, key: &str, value: Option<TypedValue>) -> StoreResult<()>;

    /// Read the value under `key` as the type described by `tag`.
    ///
    /// Returns `Ok(None)` when the key is absent or cannot be read as `tag`.
    fn get_value(&self, key: &str, tag: &TypeTag) -> StoreResult<Option<Value>>;

    /// Whether the backing storage holds a value for `key`.
    fn has_value(&self, key: &str) -> bool;

    fn delete_value(&self, key: &str) -> StoreResult<()> {
        self.save_value(key, None)
    }

    /// Subscribe to the keys changed in this store from now on.
    fn observe_changes(&self) -> ChangeStream;
}

/// Typed convenience layer over [`KeyValueStore`].
///
/// Writes apply the store write policy: [`StoreError::UnsupportedType`] and
/// [`StoreError::EncryptionUnavailable`] are returned, any other failure is
/// logged and swallowed.
pub trait KeyValueStoreExt: KeyValueStore {
    fn save<V: StoreValue>(&self, key: &str, value: Option<&V>) -> StoreResult<()> {
        let result = value
            .map(TypedValue::of)
            .transpose()
            .map_err(StoreError::from)
            .and_then(|typed| self.save_value(key, typed));
        settle_write(key, result)
    }

    fn get<V: StoreValue>(&self, key: &str) -> StoreResult<Option<V>> {
        let tag = V::type_tag();
        let Some(value) = self.get_value(key, &tag)? else {
            return Ok(None);
        };
        match V::from_value(value) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!(key, type_name = tag.name(), error = %e, "stored value has the wrong shape");
                Ok(None)
            }
        }
    }

    fn get_or<V: StoreValue>(&self, key: &str, default: V) -> StoreResult<V> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        settle_write(key, self.delete_value(key))
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

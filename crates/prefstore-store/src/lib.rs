//! Layered key-value stores over preference storage.
//!
//! This crate turns a primitive-only preference namespace into a typed store
//! with a memory cache, change notification and optional transparent
//! encryption. Stores compose by delegation and all implement the same
//! [`KeyValueStore`] contract.
//!
//! # Stores
//!
//! - [`SharedPreferenceStore`] -- base store: primitives natively, everything
//!   else through the serialiser chain
//! - [`EncryptedPreferenceStore`] -- serialise, encrypt, then store the cipher
//!   text through a delegate
//! - [`LenientEncryptedStore`] -- encrypted if supported, plain text otherwise
//! - [`ForgetfulEncryptedStore`] -- encrypted if supported, nothing otherwise
//!
//! # Backing Storage
//!
//! All backends implement the [`Preferences`] trait:
//!
//! - [`InMemoryPreferences`] -- `BTreeMap`-based, for tests and embedding
//! - [`FilePreferences`] -- one JSON document per namespace
//!
//! # Design Rules
//!
//! 1. A cached entry always equals what the backing storage holds.
//! 2. Primitives take precedence over any serialiser.
//! 3. Serialised values name their type; reading them as another type fails.
//! 4. Reads never fail on bad data. They log and return nothing.
//! 5. Writes fail only on unsupported types or missing encryption.

pub mod changes;
pub mod encrypted;
pub mod error;
pub mod forgetful;
pub mod lenient;
pub mod preferences;
pub mod serialisation;
pub mod shared;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export primary types at crate root for ergonomic imports.
pub use changes::{ChangeEmitter, ChangeStream};
pub use encrypted::EncryptedPreferenceStore;
pub use error::{
    PreferencesError, PreferencesResult, SerialisationError, SerialisationResult, StoreError,
    StoreResult,
};
pub use forgetful::ForgetfulEncryptedStore;
pub use lenient::LenientEncryptedStore;
pub use preferences::{Change, Editor, FilePreferences, InMemoryPreferences, Preferences};
pub use serialisation::{Base64Serialiser, JsonSerialiser, Serialiser, SerialiserChain};
pub use shared::SharedPreferenceStore;
pub use traits::{KeyValueStore, KeyValueStoreExt, TypedValue};

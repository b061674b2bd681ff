//! High-level API for prefstore.
//!
//! Applications build one [`StoreEntryFactory`] from a [`StoreConfig`] and
//! open typed [`StoreEntry`] handles from it, choosing per entry whether the
//! value is stored in plain text, encrypted, leniently encrypted or
//! forgetfully encrypted.
//!
//! ```
//! use prefstore_sdk::{StoreConfig, StoreEntryFactory, StoreMode};
//!
//! let factory = StoreEntryFactory::builder(StoreConfig::new("com.example")).build().unwrap();
//! let age = factory.open::<i32>("age", StoreMode::PlainText).unwrap();
//! age.save(Some(30)).unwrap();
//! assert_eq!(age.get().unwrap(), Some(30));
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod factory;
pub mod observe;

pub use config::StoreConfig;
pub use entry::StoreEntry;
pub use error::{SdkError, SdkResult};
pub use factory::{StoreEntryFactory, StoreEntryFactoryBuilder};
pub use observe::{EntryChange, Observation, Subscription};

// Re-export key types
pub use prefstore_crypto::{
    EncryptionKey, EncryptionManager, SealedEncryptionManager, UnavailableEncryptionManager,
};
pub use prefstore_store::{JsonSerialiser, KeyValueStore, KeyValueStoreExt, Serialiser};
pub use prefstore_types::{store_value, Element, MemoryCache, Serialisable, StoreMode, StoreValue};

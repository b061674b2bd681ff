//! Foundation types for prefstore.
//!
//! This crate provides the value model shared by every other prefstore crate:
//! how a Rust type declares its storage tier, the erased representation that
//! flows through the stores, the store variants, and namespace naming.
//!
//! # Key Types
//!
//! - [`ValueKind`] -- Closed set of storage kinds in dispatch precedence order
//! - [`TypeTag`] -- Explicit runtime descriptor of a storable type
//! - [`StoreValue`] -- Trait implemented by every type that can be stored
//! - [`Serialisable`] -- Marker for object-tier types the fallback codec handles
//! - [`Element`] -- Types that may sit inside a stored collection
//! - [`Value`] / [`RawValue`] -- Erased value and backing-storage primitive
//! - [`StoreMode`] -- Plain, encrypted, lenient or forgetful persistence policy
//! - [`MemoryCache`] -- Which stores keep an in-memory cache

pub mod error;
pub mod kind;
pub mod mode;
pub mod naming;
pub mod value;

pub use error::TypeError;
pub use kind::{TypeTag, ValueKind};
pub use mode::{MemoryCache, StoreMode};
pub use naming::{store_name, validate_key, MAX_STORE_NAME_LENGTH, STORE_NAME_SEPARATOR};
pub use value::{Document, Element, RawValue, Serialisable, StoreValue, Value};

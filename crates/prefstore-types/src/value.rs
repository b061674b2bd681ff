use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::kind::{TypeTag, ValueKind};

/// Object graph used as the intermediate form of object-tier values.
pub type Document = serde_json::Value;

/// A primitive as held by the backing preference storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawValue {
    Boolean(bool),
    Float(#[serde(with = "float_form")] f32),
    Long(i64),
    Int(i32),
    String(String),
}

impl RawValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Float(_) => ValueKind::Float,
            Self::Long(_) => ValueKind::Long,
            Self::Int(_) => ValueKind::Int,
            Self::String(_) => ValueKind::String,
        }
    }
}

/// Erased value flowing between typed callers and the stores.
///
/// Primitive variants mirror [`RawValue`]; object-tier values travel as a
/// [`Document`] until a serialiser turns them into a string.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Boolean(bool),
    Float(f32),
    Long(i64),
    Int(i32),
    String(String),
    Object(Document),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Float(_) => ValueKind::Float,
            Self::Long(_) => ValueKind::Long,
            Self::Int(_) => ValueKind::Int,
            Self::String(_) => ValueKind::String,
            Self::Object(_) => ValueKind::Object,
        }
    }

    /// Convert a serialisable value into an object-tier `Value`.
    ///
    /// Fails when the document does not decode back into `T`. JSON has no
    /// non-finite numbers, so a NaN nested in a struct would otherwise be
    /// saved as `null` and fail every later read.
    pub fn object<T: Serialize + DeserializeOwned>(value: &T) -> Result<Self, TypeError> {
        let document = serde_json::to_value(value).map_err(|e| TypeError::Document(e.to_string()))?;
        T::deserialize(&document)
            .map_err(|e| TypeError::Document(format!("value does not survive conversion: {e}")))?;
        Ok(Self::Object(document))
    }

    /// Decode an object-tier `Value` into `T`.
    pub fn into_object<T: DeserializeOwned>(self) -> Result<T, TypeError> {
        match self {
            Self::Object(document) => {
                serde_json::from_value(document).map_err(|e| TypeError::Document(e.to_string()))
            }
            other => Err(TypeError::KindMismatch {
                expected: ValueKind::Object,
                found: other.kind(),
            }),
        }
    }

    /// The primitive to hand to the backing storage, if this is one.
    pub fn into_raw(self) -> Option<RawValue> {
        match self {
            Self::Boolean(v) => Some(RawValue::Boolean(v)),
            Self::Float(v) => Some(RawValue::Float(v)),
            Self::Long(v) => Some(RawValue::Long(v)),
            Self::Int(v) => Some(RawValue::Int(v)),
            Self::String(v) => Some(RawValue::String(v)),
            Self::Object(_) => None,
        }
    }

    /// Document form of any value, primitives included.
    ///
    /// Used when a value must go through a serialiser regardless of its tier.
    pub fn to_document(&self) -> Document {
        match self {
            Self::Boolean(v) => Document::from(*v),
            Self::Float(v) => float_form::to_document(*v),
            Self::Long(v) => Document::from(*v),
            Self::Int(v) => Document::from(*v),
            Self::String(v) => Document::from(v.as_str()),
            Self::Object(document) => document.clone(),
        }
    }

    /// Inverse of [`Value::to_document`] for a known target kind.
    pub fn from_document(document: Document, kind: ValueKind) -> Result<Self, TypeError> {
        let mismatch = |document: &Document| TypeError::Document(format!(
            "expected {kind}, found {document}"
        ));
        match kind {
            ValueKind::Boolean => document.as_bool().map(Self::Boolean).ok_or_else(|| mismatch(&document)),
            ValueKind::Float => float_form::from_document(&document)
                .map(Self::Float)
                .ok_or_else(|| mismatch(&document)),
            ValueKind::Long => document.as_i64().map(Self::Long).ok_or_else(|| mismatch(&document)),
            ValueKind::Int => {
                let wide = document.as_i64().ok_or_else(|| mismatch(&document))?;
                i32::try_from(wide).map(Self::Int).map_err(|_| TypeError::OutOfRange {
                    kind,
                    value: wide.to_string(),
                })
            }
            ValueKind::String => match document {
                Document::String(s) => Ok(Self::String(s)),
                other => Err(mismatch(&other)),
            },
            ValueKind::Object => Ok(Self::Object(document)),
        }
    }
}

/// Lossless JSON form of an `f32`.
///
/// Finite values are JSON numbers. JSON has no NaN or infinities, so those
/// are written as the strings `"NaN"`, `"inf"` and `"-inf"`.
mod float_form {
    use super::*;

    const NAN: &str = "NaN";
    const INFINITY: &str = "inf";
    const NEG_INFINITY: &str = "-inf";

    pub(super) fn to_document(v: f32) -> Document {
        if v.is_nan() {
            Document::from(NAN)
        } else if v == f32::INFINITY {
            Document::from(INFINITY)
        } else if v == f32::NEG_INFINITY {
            Document::from(NEG_INFINITY)
        } else {
            Document::from(v)
        }
    }

    pub(super) fn from_document(document: &Document) -> Option<f32> {
        match document {
            Document::Number(n) => n.as_f64().map(|v| v as f32),
            Document::String(s) => match s.as_str() {
                NAN => Some(f32::NAN),
                INFINITY => Some(f32::INFINITY),
                NEG_INFINITY => Some(f32::NEG_INFINITY),
                _ => None,
            },
            _ => None,
        }
    }

    pub(super) fn serialize<S: Serializer>(v: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        to_document(*v).serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        let document = Document::deserialize(deserializer)?;
        from_document(&document).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a float, found {document}"))
        })
    }
}

impl From<RawValue> for Value {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Boolean(v) => Self::Boolean(v),
            RawValue::Float(v) => Self::Float(v),
            RawValue::Long(v) => Self::Long(v),
            RawValue::Int(v) => Self::Int(v),
            RawValue::String(v) => Self::String(v),
        }
    }
}

/// A type that can be saved to and read from a store.
///
/// Primitive-tier implementations exist for `bool`, `f32`, `i64`, `i32` and
/// `String`. Object-tier types get an implementation either from the
/// [`Serialisable`] marker (handled by the built-in fallback codec) or from
/// the [`store_value!`](crate::store_value) macro (handled only by a custom
/// serialiser). Collections of [`Element`]s are `Serialisable`, so
/// `Vec<String>` or `BTreeMap<String, i32>` can be stored directly.
pub trait StoreValue: Clone + Send + Sync + 'static {
    /// Runtime descriptor of `Self`.
    fn type_tag() -> TypeTag;

    /// Convert to the erased form.
    fn to_value(&self) -> Result<Value, TypeError>;

    /// Convert back from the erased form.
    fn from_value(value: Value) -> Result<Self, TypeError>;
}

/// Marker for object-tier types the built-in fallback codec may serialise.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use prefstore_types::{Serialisable, StoreValue, ValueKind};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Person { name: String, age: u32 }
///
/// impl Serialisable for Person {}
///
/// assert_eq!(Person::type_tag().kind(), ValueKind::Object);
/// assert!(Person::type_tag().is_natively_serialisable());
/// ```
pub trait Serialisable: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name embedded in fallback-codec payloads.
    ///
    /// Defaults to [`std::any::type_name`], whose output may change between
    /// compiler releases. Override it for values that must stay readable
    /// across toolchain upgrades.
    fn type_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A type that may appear inside a stored collection.
///
/// Implemented for the primitive-tier types, the other integer and float
/// widths, and every [`Serialisable`] type.
pub trait Element: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name of the element inside a collection's type name.
    fn element_name() -> &'static str;
}

impl<T: Serialisable> Element for T {
    fn element_name() -> &'static str {
        T::type_name()
    }
}

macro_rules! element {
    ($($ty:ty),+) => {$(
        impl Element for $ty {
            fn element_name() -> &'static str {
                stringify!($ty)
            }
        }
    )+};
}

element!(bool, f32, f64, i8, i16, i32, i64, u8, u16, u32, u64, String);

/// Leaks one name per distinct collection type, built once.
fn collection_name(outer: &'static str, element: &'static str) -> &'static str {
    use std::sync::{Mutex, OnceLock};

    static NAMES: OnceLock<Mutex<HashMap<(&'static str, &'static str), &'static str>>> =
        OnceLock::new();
    let mut names = NAMES
        .get_or_init(Default::default)
        .lock()
        .expect("lock poisoned");
    *names
        .entry((outer, element))
        .or_insert_with(|| Box::leak(format!("{outer}{element}>").into_boxed_str()))
}

impl<T: Element> Serialisable for Vec<T> {
    fn type_name() -> &'static str {
        collection_name("Vec<", T::element_name())
    }
}

impl<T: Element> Serialisable for BTreeMap<String, T> {
    fn type_name() -> &'static str {
        collection_name("BTreeMap<String, ", T::element_name())
    }
}

impl<T: Element> Serialisable for HashMap<String, T> {
    fn type_name() -> &'static str {
        collection_name("HashMap<String, ", T::element_name())
    }
}

impl<T: Serialisable> StoreValue for T {
    fn type_tag() -> TypeTag {
        TypeTag::object::<T>(true).with_name(T::type_name())
    }

    fn to_value(&self) -> Result<Value, TypeError> {
        Value::object(self)
    }

    fn from_value(value: Value) -> Result<Self, TypeError> {
        value.into_object()
    }
}

macro_rules! primitive_value {
    ($ty:ty, $variant:ident) => {
        impl StoreValue for $ty {
            fn type_tag() -> TypeTag {
                TypeTag::primitive::<$ty>(ValueKind::$variant).with_name(stringify!($ty))
            }

            fn to_value(&self) -> Result<Value, TypeError> {
                Ok(Value::$variant(self.clone()))
            }

            fn from_value(value: Value) -> Result<Self, TypeError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(TypeError::KindMismatch {
                        expected: ValueKind::$variant,
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

primitive_value!(bool, Boolean);
primitive_value!(f32, Float);
primitive_value!(i64, Long);
primitive_value!(i32, Int);
primitive_value!(String, String);

/// Implement [`StoreValue`] for object-tier types that only a custom
/// serialiser may handle.
///
/// The types must implement `Clone`, `serde::Serialize` and
/// `serde::de::DeserializeOwned`. Unlike [`Serialisable`] types, the fallback
/// codec refuses them, so saving one without a custom serialiser that claims
/// it fails with an unsupported-type error.
///
/// A stable name can be given with `as`; otherwise the compiler's type name
/// is used:
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use prefstore_types::{store_value, StoreValue};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Token(String);
///
/// store_value!(Token as "com.example.Token");
///
/// assert_eq!(Token::type_tag().name(), "com.example.Token");
/// ```
#[macro_export]
macro_rules! store_value {
    ($($ty:ty $(as $name:literal)?),+ $(,)?) => {$(
        impl $crate::StoreValue for $ty {
            fn type_tag() -> $crate::TypeTag {
                $crate::TypeTag::object::<$ty>(false)
                    .with_name($crate::__store_value_name!($ty $(, $name)?))
            }

            fn to_value(&self) -> ::std::result::Result<$crate::Value, $crate::TypeError> {
                $crate::Value::object(self)
            }

            fn from_value(
                value: $crate::Value,
            ) -> ::std::result::Result<Self, $crate::TypeError> {
                value.into_object()
            }
        }
    )+};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __store_value_name {
    ($ty:ty) => {
        ::std::any::type_name::<$ty>()
    };
    ($ty:ty, $name:literal) => {
        $name
    };
}

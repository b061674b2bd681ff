use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Storage kind of a value.
///
/// Variants are declared in dispatch precedence order: when a value could be
/// persisted by more than one path, the earlier kind wins. Primitive kinds are
/// persisted natively by the backing storage; [`ValueKind::Object`] goes
/// through the serialiser chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    Float,
    Long,
    Int,
    String,
    Object,
}

impl ValueKind {
    /// All kinds in precedence order.
    pub const PRECEDENCE: [ValueKind; 6] = [
        Self::Boolean,
        Self::Float,
        Self::Long,
        Self::Int,
        Self::String,
        Self::Object,
    ];

    /// Returns `true` for kinds the backing storage persists natively.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Object)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Float => write!(f, "float"),
            Self::Long => write!(f, "long"),
            Self::Int => write!(f, "int"),
            Self::String => write!(f, "string"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// Runtime descriptor of a storable type.
///
/// Stands in for a class object: it carries the type's identity, its name
/// (embedded in self-describing serialised payloads), its storage kind, and
/// whether it carries the [`Serialisable`] marker.
///
/// Two tags are equal when they describe the same Rust type.
///
/// [`Serialisable`]: crate::Serialisable
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
    kind: ValueKind,
    natively_serialisable: bool,
}

impl TypeTag {
    /// Tag for a primitive-tier type.
    pub fn primitive<T: ?Sized + 'static>(kind: ValueKind) -> Self {
        debug_assert!(kind.is_primitive());
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind,
            natively_serialisable: true,
        }
    }

    /// Tag for an object-tier type.
    pub fn object<T: ?Sized + 'static>(natively_serialisable: bool) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: ValueKind::Object,
            natively_serialisable,
        }
    }

    /// Replace the name embedded in serialised payloads.
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Name embedded in self-describing serialised payloads.
    ///
    /// Constructors start from [`std::any::type_name`], which is not stable
    /// across compiler releases; `StoreValue` implementations replace it with
    /// [`TypeTag::with_name`] where the name is persisted.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_primitive(&self) -> bool {
        self.kind.is_primitive()
    }

    /// Whether the type carries the `Serialisable` marker (primitives always do).
    pub fn is_natively_serialisable(&self) -> bool {
        self.natively_serialisable
    }

    /// Returns `true` if this tag describes `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({}: {})", self.name, self.kind)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;

    #[test]
    fn precedence_matches_declaration_order() {
        let mut sorted = ValueKind::PRECEDENCE;
        sorted.sort();
        assert_eq!(sorted, ValueKind::PRECEDENCE);
        assert_eq!(ValueKind::PRECEDENCE[0], ValueKind::Boolean);
        assert_eq!(ValueKind::PRECEDENCE[5], ValueKind::Object);
    }

    #[test]
    fn only_object_is_not_primitive() {
        let primitives: Vec<_> = ValueKind::PRECEDENCE
            .iter()
            .filter(|k| k.is_primitive())
            .collect();
        assert_eq!(primitives.len(), 5);
        assert!(!ValueKind::Object.is_primitive());
    }

    #[test]
    fn tags_compare_by_type() {
        let a = TypeTag::object::<Marker>(true);
        let b = TypeTag::object::<Marker>(false);
        let c = TypeTag::primitive::<i32>(ValueKind::Int);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(c.is::<i32>());
        assert!(!c.is::<i64>());
    }

    #[test]
    fn tag_name_is_fully_qualified() {
        let tag = TypeTag::object::<Marker>(true);
        assert!(tag.name().ends_with("kind::tests::Marker"));
        assert_eq!(tag.to_string(), tag.name());
    }

    #[test]
    fn renamed_tag_keeps_its_identity() {
        let tag = TypeTag::object::<Marker>(true);
        let renamed = tag.with_name("com.example.Marker");
        assert_eq!(renamed.name(), "com.example.Marker");
        assert_eq!(renamed, tag);
        assert!(renamed.is::<Marker>());
    }

    #[test]
    fn kind_serde_is_snake_case() {
        let json = serde_json::to_string(&ValueKind::Long).unwrap();
        assert_eq!(json, "\"long\"");
    }
}

//! Conversion of object-tier values to and from persistable strings.
//!
//! A [`SerialiserChain`] consults an optional caller-supplied serialiser first
//! and the built-in [`Base64Serialiser`] second. Serialisers work on the
//! [`Document`] form of a value so the trait stays object-safe.

mod fallback;
mod json;

use std::sync::Arc;

use prefstore_types::{Document, TypeTag, Value};
use tracing::debug;

use crate::error::{SerialisationResult, StoreError, StoreResult};

pub use fallback::{Base64Serialiser, DELIMITER, PREFIX};
pub use json::JsonSerialiser;

/// Converts values of the types it claims to and from strings.
pub trait Serialiser: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Whether values described by `tag` can be (de)serialised.
    fn can_handle_type(&self, tag: &TypeTag) -> bool;

    /// Whether `serialised` looks like something this serialiser produced.
    fn can_handle_serialised_format(&self, serialised: &str) -> bool;

    fn serialise(&self, document: &Document, tag: &TypeTag) -> SerialisationResult<String>;

    fn deserialise(&self, serialised: &str, tag: &TypeTag) -> SerialisationResult<Document>;
}

/// Custom serialiser first, built-in fallback codec second.
#[derive(Clone)]
pub struct SerialiserChain {
    custom: Option<Arc<dyn Serialiser>>,
    fallback: Base64Serialiser,
}

impl SerialiserChain {
    pub fn new(custom: Option<Arc<dyn Serialiser>>) -> Self {
        Self {
            custom,
            fallback: Base64Serialiser,
        }
    }

    /// Whether a custom serialiser is installed.
    pub fn has_custom(&self) -> bool {
        self.custom.is_some()
    }

    /// Whether any serialiser in the chain claims `tag`.
    pub fn can_handle_type(&self, tag: &TypeTag) -> bool {
        self.custom.as_ref().is_some_and(|c| c.can_handle_type(tag))
            || self.fallback.can_handle_type(tag)
    }

    /// Serialise `value` with the first serialiser claiming its type.
    ///
    /// Fails with [`StoreError::UnsupportedType`] when none does.
    pub fn serialise(&self, value: &Value, tag: &TypeTag) -> StoreResult<String> {
        let serialiser = self.for_type(tag).ok_or_else(|| StoreError::UnsupportedType {
            type_name: tag.name().to_string(),
        })?;
        debug!(serialiser = serialiser.name(), type_name = tag.name(), "serialising");
        Ok(serialiser.serialise(&value.to_document(), tag)?)
    }

    /// Deserialise `serialised` as `tag`.
    ///
    /// The custom serialiser is used only when it claims both the type and the
    /// format. Returns `Ok(None)` when no serialiser claims the type.
    pub fn deserialise(&self, serialised: &str, tag: &TypeTag) -> StoreResult<Option<Value>> {
        let custom = self.custom.as_deref().filter(|c| {
            c.can_handle_type(tag) && c.can_handle_serialised_format(serialised)
        });
        let serialiser: &dyn Serialiser = match custom {
            Some(c) => c,
            None if self.fallback.can_handle_type(tag) => &self.fallback,
            None => return Ok(None),
        };

        let document = serialiser.deserialise(serialised, tag)?;
        Ok(Some(Value::from_document(document, tag.kind())?))
    }

    fn for_type(&self, tag: &TypeTag) -> Option<&dyn Serialiser> {
        match &self.custom {
            Some(custom) if custom.can_handle_type(tag) => Some(&**custom),
            _ if self.fallback.can_handle_type(tag) => Some(&self.fallback),
            _ => None,
        }
    }
}

impl Default for SerialiserChain {
    fn default() -> Self {
        Self::new(None)
    }
}

impl std::fmt::Debug for SerialiserChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialiserChain")
            .field("custom", &self.custom.as_ref().map(|c| c.name()))
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use prefstore_types::{Serialisable, StoreValue};
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::error::SerialisationError;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
        age: u32,
    }

    impl Serialisable for Person {}

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Token {
        value: String,
    }

    prefstore_types::store_value!(Token);

    fn smith() -> Person {
        Person {
            name: "Smith".into(),
            age: 30,
        }
    }

    #[test]
    fn fallback_roundtrips_marked_types() {
        let chain = SerialiserChain::default();
        let tag = Person::type_tag();
        let s = chain.serialise(&smith().to_value().unwrap(), &tag).unwrap();
        assert!(s.starts_with(PREFIX));

        let back = chain.deserialise(&s, &tag).unwrap().unwrap();
        assert_eq!(Person::from_value(back).unwrap(), smith());
    }

    #[test]
    fn unmarked_type_is_unsupported_without_custom() {
        let chain = SerialiserChain::default();
        let token = Token { value: "t".into() };
        let err = chain
            .serialise(&token.to_value().unwrap(), &Token::type_tag())
            .unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedType { .. }));
        assert!(chain.deserialise("{}", &Token::type_tag()).unwrap().is_none());
    }

    #[test]
    fn custom_serialiser_takes_precedence() {
        let chain = SerialiserChain::new(Some(Arc::new(JsonSerialiser)));
        let tag = Person::type_tag();
        let s = chain.serialise(&smith().to_value().unwrap(), &tag).unwrap();
        assert!(!s.starts_with(PREFIX));
        assert_eq!(
            serde_json::from_str::<Person>(&s).unwrap(),
            smith(),
            "custom output is plain json"
        );

        let back = chain.deserialise(&s, &tag).unwrap().unwrap();
        assert_eq!(Person::from_value(back).unwrap(), smith());
    }

    #[test]
    fn custom_handles_types_the_fallback_refuses() {
        let chain = SerialiserChain::new(Some(Arc::new(JsonSerialiser)));
        let token = Token { value: "abc".into() };
        let s = chain
            .serialise(&token.to_value().unwrap(), &Token::type_tag())
            .unwrap();
        let back = chain.deserialise(&s, &Token::type_tag()).unwrap().unwrap();
        assert_eq!(Token::from_value(back).unwrap(), token);
    }

    #[test]
    fn load_falls_back_when_custom_rejects_format() {
        let fallback_only = SerialiserChain::default();
        let tag = Person::type_tag();
        let legacy = fallback_only
            .serialise(&smith().to_value().unwrap(), &tag)
            .unwrap();

        let chain = SerialiserChain::new(Some(Arc::new(JsonSerialiser)));
        let back = chain.deserialise(&legacy, &tag).unwrap().unwrap();
        assert_eq!(Person::from_value(back).unwrap(), smith());
    }

    #[test]
    fn primitives_serialise_through_fallback() {
        let chain = SerialiserChain::new(Some(Arc::new(JsonSerialiser)));
        let tag = i32::type_tag();
        let s = chain.serialise(&Value::Int(30), &tag).unwrap();
        assert!(s.starts_with(PREFIX));
        assert_eq!(chain.deserialise(&s, &tag).unwrap(), Some(Value::Int(30)));
    }

    #[test]
    fn mismatched_target_is_reported() {
        let chain = SerialiserChain::default();
        let s = chain.serialise(&Value::Int(30), &i32::type_tag()).unwrap();
        let err = chain.deserialise(&s, &i64::type_tag()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Serialisation(SerialisationError::Mismatch { .. })
        ));
    }
}

use prefstore_types::{Document, TypeTag, ValueKind};

use super::Serialiser;
use crate::error::{SerialisationError, SerialisationResult};

/// Custom serialiser writing object-tier values as plain JSON.
///
/// Claims every object-tier type, including those registered with
/// `store_value!` that the fallback codec refuses. Primitives are left to the
/// fallback codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonSerialiser;

impl Serialiser for JsonSerialiser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn can_handle_type(&self, tag: &TypeTag) -> bool {
        tag.kind() == ValueKind::Object
    }

    fn can_handle_serialised_format(&self, serialised: &str) -> bool {
        serde_json::from_str::<serde::de::IgnoredAny>(serialised).is_ok()
    }

    fn serialise(&self, document: &Document, _tag: &TypeTag) -> SerialisationResult<String> {
        serde_json::to_string(document).map_err(|e| SerialisationError::Serialisation(e.to_string()))
    }

    fn deserialise(&self, serialised: &str, _tag: &TypeTag) -> SerialisationResult<Document> {
        serde_json::from_str(serialised).map_err(|e| SerialisationError::Serialisation(e.to_string()))
    }
}

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use prefstore_types::{Document, TypeTag};

use super::Serialiser;
use crate::error::{SerialisationError, SerialisationResult};

/// Marks the start of a fallback-codec payload.
pub const PREFIX: &str = "BASE_64_";

/// Separates the embedded type name from the encoded bytes.
pub const DELIMITER: &str = "_START_DATA_";

/// Built-in fallback codec.
///
/// Handles primitives and types carrying the `Serialisable` marker. Output is
/// self-describing: `PREFIX + type name + DELIMITER + base64(json bytes)`, and
/// reading it back as any other type fails with a mismatch.
#[derive(Clone, Copy, Debug, Default)]
pub struct Base64Serialiser;

impl Base64Serialiser {
    fn read(serialised: &str) -> Option<(&str, &str)> {
        serialised.strip_prefix(PREFIX)?.split_once(DELIMITER)
    }
}

impl Serialiser for Base64Serialiser {
    fn name(&self) -> &'static str {
        "base64"
    }

    fn can_handle_type(&self, tag: &TypeTag) -> bool {
        tag.is_primitive() || tag.is_natively_serialisable()
    }

    fn can_handle_serialised_format(&self, serialised: &str) -> bool {
        Self::read(serialised).is_some()
    }

    fn serialise(&self, document: &Document, tag: &TypeTag) -> SerialisationResult<String> {
        if !self.can_handle_type(tag) {
            return Err(SerialisationError::UnsupportedType {
                serialiser: self.name(),
                type_name: tag.name().to_string(),
            });
        }
        let bytes = serde_json::to_vec(document)
            .map_err(|e| SerialisationError::Serialisation(e.to_string()))?;
        Ok(format!("{PREFIX}{}{DELIMITER}{}", tag.name(), STANDARD.encode(bytes)))
    }

    fn deserialise(&self, serialised: &str, tag: &TypeTag) -> SerialisationResult<Document> {
        let (name, payload) =
            Self::read(serialised).ok_or_else(|| SerialisationError::Mismatch {
                expected: tag.name().to_string(),
                found: "no base64 format markers".to_string(),
            })?;
        if name != tag.name() {
            return Err(SerialisationError::Mismatch {
                expected: tag.name().to_string(),
                found: name.to_string(),
            });
        }

        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| SerialisationError::Serialisation(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| SerialisationError::Serialisation(e.to_string()))
    }
}

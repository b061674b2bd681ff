//! Store namespace naming and key validation.
//!
//! A namespace name joins an application identifier and a logical store name
//! with [`STORE_NAME_SEPARATOR`]. When the result would exceed
//! [`MAX_STORE_NAME_LENGTH`] characters, the application identifier is
//! trimmed from the left; the logical name is never shortened.

use crate::error::TypeError;

/// Maximum length, in characters, of a namespace name.
pub const MAX_STORE_NAME_LENGTH: usize = 127;

/// Separator between the application identifier and the logical name.
pub const STORE_NAME_SEPARATOR: char = '$';

/// Derive the namespace name for `name` within application `app_id`.
///
/// # Examples
///
/// ```
/// use prefstore_types::naming::store_name;
///
/// assert_eq!(store_name("com.example.app", "settings").unwrap(), "com.example.app$settings");
/// assert!(store_name("com.example.app", "").is_err());
/// ```
pub fn store_name(app_id: &str, name: &str) -> Result<String, TypeError> {
    if name.is_empty() {
        return Err(TypeError::InvalidStoreName {
            name: name.to_string(),
            reason: "store name must not be empty".into(),
        });
    }

    let name_len = name.chars().count();
    let Some(available) = MAX_STORE_NAME_LENGTH.checked_sub(name_len + 1) else {
        return Err(TypeError::InvalidStoreName {
            name: name.to_string(),
            reason: format!("longer than {} characters", MAX_STORE_NAME_LENGTH - 1),
        });
    };

    let app_len = app_id.chars().count();
    let app_id: String = if app_len > available {
        app_id.chars().skip(app_len - available).collect()
    } else {
        app_id.to_string()
    };

    Ok(format!("{app_id}{STORE_NAME_SEPARATOR}{name}"))
}

/// Validate an entry key, returning `Ok(())` if usable.
pub fn validate_key(key: &str) -> Result<(), TypeError> {
    if key.is_empty() {
        return Err(TypeError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_names_are_joined() {
        assert_eq!(store_name("app", "prefs").unwrap(), "app$prefs");
    }

    #[test]
    fn long_app_id_is_trimmed_from_the_left() {
        let app_id = "x".repeat(100) + "tail";
        let name = "n".repeat(30);
        let joined = store_name(&app_id, &name).unwrap();
        assert_eq!(joined.chars().count(), MAX_STORE_NAME_LENGTH);
        assert!(joined.ends_with(&format!("tail${name}")));
    }

    #[test]
    fn name_filling_the_limit_leaves_empty_app_id() {
        let name = "n".repeat(MAX_STORE_NAME_LENGTH - 1);
        let joined = store_name("app", &name).unwrap();
        assert_eq!(joined, format!("${name}"));
    }

    #[test]
    fn overlong_name_is_rejected() {
        let name = "n".repeat(MAX_STORE_NAME_LENGTH);
        assert!(store_name("app", &name).is_err());
    }

    #[test]
    fn multibyte_app_id_is_trimmed_on_char_boundaries() {
        let app_id = "head".to_string() + &"é".repeat(130);
        let joined = store_name(&app_id, "prefs").unwrap();
        assert!(!joined.contains("head"));
        assert_eq!(joined.chars().count(), MAX_STORE_NAME_LENGTH);
        assert!(joined.ends_with("é$prefs"));
        assert_eq!(joined.chars().filter(|&c| c == 'é').count(), MAX_STORE_NAME_LENGTH - 6);
    }

    #[test]
    fn empty_key_is_invalid() {
        assert!(validate_key("").is_err());
        assert!(validate_key("age").is_ok());
    }

    proptest! {
        #[test]
        fn joined_name_never_exceeds_limit(app_id in ".{0,200}", name in ".{1,60}") {
            let joined = store_name(&app_id, &name).unwrap();
            prop_assert!(joined.chars().count() <= MAX_STORE_NAME_LENGTH);
            let suffix = format!("{STORE_NAME_SEPARATOR}{name}");
            prop_assert!(joined.ends_with(&suffix));
        }
    }
}

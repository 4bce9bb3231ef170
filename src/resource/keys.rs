//! Typed key extraction from generic string maps (path parameters, query parameters).

use crate::error::ApiError;
use crate::resource::Identifier;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyValue {
    Int(i32),
}

/// Extracted key fields by name, handed to `Identifier::keys_from_map`.
pub type KeyMap = BTreeMap<&'static str, KeyValue>;

/// One identity-bearing field and how to extract it from a raw string.
#[derive(Clone, Copy)]
pub struct KeyFieldInfo {
    pub field: &'static str,
    pub extract: fn(&str) -> Result<KeyValue, String>,
}

pub fn get_int_key(raw: &str) -> Result<KeyValue, String> {
    raw.trim()
        .parse::<i32>()
        .map(KeyValue::Int)
        .map_err(|_| "cannot parse to integer".to_string())
}

/// Surrogate integer key shared by every shipped resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdKey {
    pub id: i32,
}

impl IdKey {
    pub const FIELDS: &'static [KeyFieldInfo] = &[KeyFieldInfo {
        field: "id",
        extract: get_int_key,
    }];

    pub fn from_map(map: &KeyMap) -> Option<Self> {
        match map.get("id") {
            Some(KeyValue::Int(id)) => Some(IdKey { id: *id }),
            _ => None,
        }
    }
}

/// Apply `R`'s key descriptors, in order, to `params`. Every field must be present and valid.
pub fn parse_keys<R: Identifier>(params: &HashMap<String, String>) -> Result<R::Keys, ApiError> {
    let mut map = KeyMap::new();
    let mut errors = Vec::new();
    for info in R::key_fields() {
        match params.get(info.field) {
            None => errors.push(format!("{}: missing key", info.field)),
            Some(raw) => match (info.extract)(raw) {
                Ok(v) => {
                    map.insert(info.field, v);
                }
                Err(reason) => errors.push(format!("{}: {}", info.field, reason)),
            },
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    R::keys_from_map(&map).ok_or_else(|| ApiError::validation(format!("invalid {} key", R::DISPLAY_NAME)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_key_parses() {
        assert_eq!(get_int_key("12"), Ok(KeyValue::Int(12)));
        assert!(get_int_key("twelve").is_err());
        assert!(get_int_key("99999999999").is_err());
    }

    #[test]
    fn id_key_from_map_requires_id() {
        let mut map = KeyMap::new();
        assert_eq!(IdKey::from_map(&map), None);
        map.insert("id", KeyValue::Int(1));
        assert_eq!(IdKey::from_map(&map), Some(IdKey { id: 1 }));
    }
}

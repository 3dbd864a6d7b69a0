//! Typed access to the generator's additional-properties map.
//!
//! The host invocation path only carries flat `key=value` strings. This module
//! is the boundary between that map-based contract and the typed structs the
//! decoder and resolver work with: [`parse_additional_properties`] reads the
//! raw `-p` form, and [`GenerationProperties`] lifts out the keys Relaygen
//! understands so nothing downstream looks values up by string.

use serde_json::Value as JsonValue;

use crate::Error;

/// Property map handed to templates, keyed by property name
pub type PropertyMap = serde_json::Map<String, JsonValue>;

/// Selects the operation to resolve
pub const OPERATION_ID: &str = "operationId";
/// `.`-delimited base64 target records
pub const TARGETS: &str = "targets";
/// Base64 request mapping expression
pub const REQUEST_MAPPING: &str = "requestMapping";
/// Base64 response mapping expression
pub const RESPONSE_MAPPING: &str = "responseMapping";

/// Parse an openapi-generator style additional-properties string.
///
/// Entries are separated by `,` and split on their first `=`, so base64
/// padding in values survives. Blank entries are ignored.
///
/// ```
/// use relaygen_core::properties::parse_additional_properties;
///
/// let props = parse_additional_properties("operationId=getPet,requestMapping=e30=").unwrap();
/// assert_eq!(props["operationId"], "getPet");
/// assert_eq!(props["requestMapping"], "e30=");
/// ```
pub fn parse_additional_properties(raw: &str) -> crate::Result<PropertyMap> {
    let mut map = PropertyMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (key, value) = entry.split_once('=').ok_or_else(|| {
            Error::config(format!(
                "Additional property '{}' is not of the form key=value",
                entry
            ))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::config(format!(
                "Additional property '{}' has an empty key",
                entry
            )));
        }
        map.insert(key.to_string(), JsonValue::String(value.trim().to_string()));
    }
    Ok(map)
}

/// Generator properties with the keys Relaygen consumes lifted into fields.
///
/// Only string values are lifted. A key whose value is already structured
/// (for example a `targets` array from an earlier decode) stays in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationProperties {
    /// Identifier of the operation to resolve
    pub operation_id: Option<String>,
    /// Raw `.`-delimited base64 target records
    pub targets: Option<String>,
    /// Raw base64 request mapping
    pub request_mapping: Option<String>,
    /// Raw base64 response mapping
    pub response_mapping: Option<String>,
    /// Every other property, passed through to templates unchanged
    pub extra: PropertyMap,
}

impl GenerationProperties {
    /// Split a host property map into typed fields and pass-through values
    pub fn from_map(mut map: PropertyMap) -> Self {
        Self {
            operation_id: take_string(&mut map, OPERATION_ID),
            targets: take_string(&mut map, TARGETS),
            request_mapping: take_string(&mut map, REQUEST_MAPPING),
            response_mapping: take_string(&mut map, RESPONSE_MAPPING),
            extra: map,
        }
    }
}

fn take_string(map: &mut PropertyMap, key: &str) -> Option<String> {
    match map.get(key) {
        Some(JsonValue::String(_)) => match map.remove(key) {
            Some(JsonValue::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

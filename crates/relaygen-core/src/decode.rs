//! Decoding of the base64 transported generator properties.
//!
//! Three properties arrive encoded because the host invocation path only
//! carries flat strings:
//!
//! - `targets`: `.`-separated segments, each a base64 encoded JSON object of
//!   scalars describing one forwarding target.
//! - `requestMapping` / `responseMapping`: a single base64 encoded text.
//!
//! A `targets` segment that fails to decode never disappears silently. Under
//! the default [`SegmentPolicy::Skip`] it is left out of the decoded sequence
//! and returned as a diagnostic; under [`SegmentPolicy::Strict`] the run fails.
//!
//! # Examples
//!
//! ```
//! use relaygen_core::decode::decode_targets;
//!
//! let decoded = decode_targets("eyJuYW1lIjoiYSJ9.eyJuYW1lIjoiYiJ9");
//! assert!(decoded.errors.is_empty());
//! assert_eq!(decoded.targets[0].get("name"), Some("a"));
//! assert_eq!(decoded.targets[1].get("name"), Some("b"));
//! ```

// Internal imports (std, crate)
use std::collections::BTreeMap;
use std::fmt;

use crate::error::DecodeError;
use crate::hooks::PreprocessHook;
use crate::properties::{
    GenerationProperties, OPERATION_ID, PropertyMap, REQUEST_MAPPING, RESPONSE_MAPPING, TARGETS,
};

// External imports (alphabetized)
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Standard alphabet; trailing `=` padding may be present or omitted
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Caller-supplied description of one forwarding target.
///
/// The keys are not interpreted by Relaygen; they are handed to templates as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetDescriptor(BTreeMap<String, String>);

impl TargetDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a descriptor from a decoded JSON value.
    ///
    /// Strings are kept, booleans and numbers are stored in their JSON text
    /// form. Anything else makes the segment fail.
    fn from_json(index: usize, value: JsonValue) -> Result<Self, DecodeError> {
        let JsonValue::Object(object) = value else {
            return Err(DecodeError::TargetShape {
                index,
                reason: "must be a JSON object".to_string(),
            });
        };

        let mut entries = BTreeMap::new();
        for (key, value) in object {
            let value = match value {
                JsonValue::String(s) => s,
                JsonValue::Bool(b) => b.to_string(),
                JsonValue::Number(n) => n.to_string(),
                _ => {
                    return Err(DecodeError::TargetShape {
                        index,
                        reason: format!("has a non-scalar value for key '{}'", key),
                    });
                }
            };
            entries.insert(key, value);
        }
        Ok(Self(entries))
    }

    fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                .collect(),
        )
    }
}

impl FromIterator<(String, String)> for TargetDescriptor {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Decoded request or response mapping text, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MappingExpression(String);

impl MappingExpression {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MappingExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of decoding a `targets` value
#[derive(Debug, Default)]
pub struct TargetDecoding {
    /// Descriptors of the segments that decoded, in segment order
    pub targets: Vec<TargetDescriptor>,
    /// One error per segment that did not
    pub errors: Vec<DecodeError>,
}

/// Decode a `.`-delimited list of base64 JSON target records.
///
/// Segments may carry or omit their `=` padding.
///
/// Empty segments are ignored. Segment indices in errors count every segment
/// of the split, empty ones included.
pub fn decode_targets(raw: &str) -> TargetDecoding {
    let mut decoding = TargetDecoding::default();
    for (index, segment) in raw.split('.').enumerate() {
        if segment.is_empty() {
            continue;
        }
        match decode_target_segment(index, segment) {
            Ok(target) => decoding.targets.push(target),
            Err(e) => decoding.errors.push(e),
        }
    }
    decoding
}

fn decode_target_segment(index: usize, segment: &str) -> Result<TargetDescriptor, DecodeError> {
    let bytes = LENIENT
        .decode(segment.as_bytes())
        .map_err(|source| DecodeError::TargetBase64 { index, source })?;
    let value: JsonValue = serde_json::from_slice(&bytes)
        .map_err(|source| DecodeError::TargetJson { index, source })?;
    TargetDescriptor::from_json(index, value)
}

/// Decode a base64 mapping property into trimmed text.
///
/// Padding is optional, as for `targets` segments.
///
/// `key` names the property in the error. Invalid UTF-8 is replaced rather
/// than rejected; the text itself is never validated.
pub fn decode_mapping(key: &'static str, raw: &str) -> Result<MappingExpression, DecodeError> {
    let bytes = LENIENT
        .decode(raw.as_bytes())
        .map_err(|source| DecodeError::MappingBase64 { key, source })?;
    Ok(MappingExpression(
        String::from_utf8_lossy(&bytes).trim().to_string(),
    ))
}

/// Encode mapping text into its transport form
pub fn encode_mapping(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Encode target descriptors into a `targets` property value
pub fn encode_targets(targets: &[TargetDescriptor]) -> String {
    targets
        .iter()
        .map(|t| STANDARD.encode(t.to_json().to_string()))
        .collect::<Vec<_>>()
        .join(".")
}

/// What to do with a `targets` segment that fails to decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SegmentPolicy {
    /// Leave the segment out and report it as a diagnostic
    #[default]
    Skip,
    /// Fail the run on the first bad segment
    Strict,
}

/// Generator properties after decoding.
///
/// This is what flows from the preprocessing stage to the resolver and the
/// template context; [`DecodedConfig::into_properties`] turns it back into the
/// map the host engine renders with.
#[derive(Debug, Default)]
pub struct DecodedConfig {
    pub operation_id: Option<String>,
    pub targets: Option<Vec<TargetDescriptor>>,
    pub request_mapping: Option<MappingExpression>,
    pub response_mapping: Option<MappingExpression>,
    /// Segments skipped under [`SegmentPolicy::Skip`]
    pub diagnostics: Vec<DecodeError>,
    /// Properties the decoder does not touch
    pub extra: PropertyMap,
}

impl DecodedConfig {
    /// Write decoded values back under their original keys.
    ///
    /// Diagnostics are not part of the map; take them before converting.
    pub fn into_properties(self) -> PropertyMap {
        let mut map = self.extra;
        if let Some(operation_id) = self.operation_id {
            map.insert(OPERATION_ID.to_string(), JsonValue::String(operation_id));
        }
        if let Some(targets) = self.targets {
            map.insert(
                TARGETS.to_string(),
                JsonValue::Array(targets.iter().map(TargetDescriptor::to_json).collect()),
            );
        }
        if let Some(mapping) = self.request_mapping {
            map.insert(
                REQUEST_MAPPING.to_string(),
                JsonValue::String(mapping.into_string()),
            );
        }
        if let Some(mapping) = self.response_mapping {
            map.insert(
                RESPONSE_MAPPING.to_string(),
                JsonValue::String(mapping.into_string()),
            );
        }
        map
    }
}

/// Preprocessing stage that decodes the transported properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigurationDecoder {
    policy: SegmentPolicy,
}

impl ConfigurationDecoder {
    pub fn new(policy: SegmentPolicy) -> Self {
        Self { policy }
    }
}

impl PreprocessHook for ConfigurationDecoder {
    fn preprocess(&self, properties: GenerationProperties) -> crate::Result<DecodedConfig> {
        let GenerationProperties {
            operation_id,
            targets,
            request_mapping,
            response_mapping,
            extra,
        } = properties;

        let mut diagnostics = Vec::new();
        let targets = match targets {
            Some(raw) => {
                let mut decoding = decode_targets(&raw);
                if self.policy == SegmentPolicy::Strict && !decoding.errors.is_empty() {
                    return Err(decoding.errors.remove(0).into());
                }
                for error in &decoding.errors {
                    log::warn!("Skipping target: {}", error);
                }
                log::debug!("Decoded {} target(s)", decoding.targets.len());
                diagnostics = decoding.errors;
                Some(decoding.targets)
            }
            None => None,
        };

        let request_mapping = request_mapping
            .map(|raw| decode_mapping(REQUEST_MAPPING, &raw))
            .transpose()?;
        let response_mapping = response_mapping
            .map(|raw| decode_mapping(RESPONSE_MAPPING, &raw))
            .transpose()?;

        Ok(DecodedConfig {
            operation_id,
            targets,
            request_mapping,
            response_mapping,
            diagnostics,
            extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde_json::json;

    fn props(pairs: &[(&str, &str)]) -> GenerationProperties {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect::<PropertyMap>();
        GenerationProperties::from_map(map)
    }

    #[test]
    fn test_decode_targets_in_segment_order() {
        let decoded = decode_targets("eyJuYW1lIjoiYSJ9.eyJuYW1lIjoiYiJ9");
        assert!(decoded.errors.is_empty());
        let names: Vec<_> = decoded
            .targets
            .iter()
            .filter_map(|t| t.get("name"))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_decode_targets_skips_bad_segment() {
        let decoded = decode_targets("eyJuYW1lIjoiYSJ9.!!not-base64!!.eyJuYW1lIjoiYiJ9");
        assert_eq!(decoded.targets.len(), 2);
        assert_eq!(decoded.errors.len(), 1);
        assert_eq!(decoded.errors[0].segment_index(), Some(1));
        assert!(decoded.errors[0].to_string().contains("segment 1"));
    }

    #[test]
    fn test_decode_targets_accepts_missing_padding() {
        // "{}" and {"name":"a"} without their trailing '='
        let decoded = decode_targets("e30.eyJuYW1lIjoiYSJ9.e30=");
        assert!(decoded.errors.is_empty());
        assert_eq!(decoded.targets.len(), 3);
        assert!(decoded.targets[0].is_empty());
        assert_eq!(decoded.targets[1].get("name"), Some("a"));
    }

    #[test]
    fn test_unpadded_segment_before_bad_one() {
        let decoded = decode_targets("e30.!!");
        assert_eq!(decoded.targets.len(), 1);
        assert_eq!(decoded.errors.len(), 1);
        assert_eq!(decoded.errors[0].segment_index(), Some(1));
    }

    #[test]
    fn test_decode_mapping_accepts_missing_padding() {
        // "$ " unpadded
        let mapping = decode_mapping(RESPONSE_MAPPING, "JCA").unwrap();
        assert_eq!(mapping.as_str(), "$");
    }

    #[test]
    fn test_decode_targets_reports_json_and_shape_errors() {
        // "not json" and "[1]"
        let decoded = decode_targets("bm90IGpzb24=.WzFd");
        assert!(decoded.targets.is_empty());
        assert!(matches!(
            decoded.errors[0],
            DecodeError::TargetJson { index: 0, .. }
        ));
        assert!(matches!(
            decoded.errors[1],
            DecodeError::TargetShape { index: 1, .. }
        ));
    }

    #[test]
    fn test_decode_targets_ignores_empty_segments() {
        let decoded = decode_targets(".eyJuYW1lIjoiYSJ9..");
        assert_eq!(decoded.targets.len(), 1);
        assert!(decoded.errors.is_empty());
        assert!(decode_targets("").targets.is_empty());
    }

    #[test]
    fn test_scalar_values_are_stringified() {
        // {"targetHasBody":true,"port":8080,"name":"x"}
        let raw = encode_value(&json!({"targetHasBody": true, "port": 8080, "name": "x"}));
        let decoded = decode_targets(&raw);
        let target = &decoded.targets[0];
        assert_eq!(target.get("targetHasBody"), Some("true"));
        assert_eq!(target.get("port"), Some("8080"));
        assert_eq!(target.get("name"), Some("x"));
    }

    #[test]
    fn test_nested_values_fail_segment() {
        let raw = encode_value(&json!({"nested": {"a": "b"}}));
        let decoded = decode_targets(&raw);
        assert!(decoded.targets.is_empty());
        assert!(decoded.errors[0].to_string().contains("nested"));
    }

    #[test]
    fn test_decode_mapping_trims() {
        let mapping = decode_mapping(REQUEST_MAPPING, &encode_mapping("\n  { \"a\": b }\t\n")).unwrap();
        assert_eq!(mapping.as_str(), "{ \"a\": b }");
    }

    #[test]
    fn test_mapping_round_trip_is_trim() {
        for text in ["", "   ", "x", " $.foo ", "line1\nline2\n"] {
            let decoded = decode_mapping(RESPONSE_MAPPING, &encode_mapping(text)).unwrap();
            assert_eq!(decoded.as_str(), text.trim());
        }
    }

    #[test]
    fn test_decode_mapping_rejects_bad_base64() {
        let err = decode_mapping(RESPONSE_MAPPING, "***").unwrap_err();
        assert!(err.to_string().starts_with("responseMapping"));
        assert_eq!(err.segment_index(), None);
    }

    #[test]
    fn test_encode_targets_round_trip() {
        let mut a = TargetDescriptor::new();
        a.insert("targetApiId", "petstore");
        let mut b = TargetDescriptor::new();
        b.insert("targetApiId", "shop");
        b.insert("targetFunctionName", "addPet");

        let decoded = decode_targets(&encode_targets(&[a.clone(), b.clone()]));
        assert_eq!(decoded.targets, vec![a, b]);
    }

    #[test]
    fn test_preprocess_without_properties_is_noop() {
        let decoded = ConfigurationDecoder::default()
            .preprocess(props(&[("projectVersion", "0.0.1")]))
            .unwrap();
        assert!(decoded.targets.is_none());
        assert!(decoded.request_mapping.is_none());
        assert!(decoded.response_mapping.is_none());
        assert!(decoded.diagnostics.is_empty());

        let map = decoded.into_properties();
        assert_eq!(map.len(), 1);
        assert_eq!(map["projectVersion"], json!("0.0.1"));
    }

    #[test]
    fn test_preprocess_decodes_into_properties() {
        let decoded = ConfigurationDecoder::default()
            .preprocess(props(&[
                ("operationId", "getPet"),
                ("targets", "eyJuYW1lIjoiYSJ9.eyJuYW1lIjoiYiJ9"),
                ("requestMapping", encode_mapping(" req ").as_str()),
                ("responseMapping", encode_mapping("res\n").as_str()),
            ]))
            .unwrap();

        let map = decoded.into_properties();
        assert_eq!(map["operationId"], json!("getPet"));
        assert_eq!(map["targets"], json!([{"name": "a"}, {"name": "b"}]));
        assert_eq!(map["requestMapping"], json!("req"));
        assert_eq!(map["responseMapping"], json!("res"));
    }

    #[test]
    fn test_preprocess_collects_diagnostics() {
        let mut decoded = ConfigurationDecoder::new(SegmentPolicy::Skip)
            .preprocess(props(&[("targets", "eyJuYW1lIjoiYSJ9.%%%")]))
            .unwrap();
        let diagnostics = std::mem::take(&mut decoded.diagnostics);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].segment_index(), Some(1));
        assert_eq!(decoded.targets.map(|t| t.len()), Some(1));
    }

    #[test]
    fn test_preprocess_strict_fails_run() {
        let result = ConfigurationDecoder::new(SegmentPolicy::Strict)
            .preprocess(props(&[("targets", "eyJuYW1lIjoiYSJ9.%%%")]));
        match result {
            Err(Error::Decode(e)) => assert_eq!(e.segment_index(), Some(1)),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_preprocess_bad_mapping_fails_run() {
        let result =
            ConfigurationDecoder::default().preprocess(props(&[("requestMapping", "@@")]));
        assert!(matches!(
            result,
            Err(Error::Decode(DecodeError::MappingBase64 { key: "requestMapping", .. }))
        ));
    }

    #[test]
    fn test_preprocess_is_idempotent_on_structured_output() {
        let decoder = ConfigurationDecoder::default();
        let first = decoder
            .preprocess(props(&[
                ("targets", "eyJuYW1lIjoiYSJ9"),
                ("usePromises", "true"),
            ]))
            .unwrap()
            .into_properties();

        let second = decoder
            .preprocess(GenerationProperties::from_map(first.clone()))
            .unwrap()
            .into_properties();
        assert_eq!(first, second);
    }

    fn encode_value(value: &JsonValue) -> String {
        STANDARD.encode(value.to_string())
    }
}

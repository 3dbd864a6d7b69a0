//! Chaining target runs into an adapter run.
//!
//! A target run writes `parsed-target.txt`, six lines describing how to call
//! the target operation. [`TargetSummary`] reads that file back and, together
//! with the [`TargetRef`] the target was requested under, produces the
//! [`TargetDescriptor`] an adapter run expects inside its `targets` property.
//!
//! # Examples
//!
//! ```
//! use relaygen_core::summary::{TargetRef, TargetSummary};
//!
//! let summary = TargetSummary::parse("PetApi\ntrue\npet\ntrue\npet, opts\ntrue\n").unwrap();
//! let target = TargetRef::parse("petstore_add-pet_200").unwrap();
//! let descriptor = summary.to_descriptor(&target);
//! assert_eq!(descriptor.get("targetFunctionName"), Some("addPet"));
//! assert_eq!(descriptor.get("targetOptions"), Some("pet"));
//! ```

use std::fmt;
use std::path::Path;

use crate::decode::TargetDescriptor;
use crate::operation::OPTIONAL_ARGS_NAME;
use crate::utils::camelize;
use crate::Error;

/// Number of lines in a `parsed-target.txt`
const SUMMARY_LINES: usize = 6;

/// Call shape of a target operation, as written by a target run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSummary {
    pub api_name: String,
    pub has_body: bool,
    pub body_name: Option<String>,
    pub body_required: bool,
    /// Positional arguments without the trailing optional-arguments object
    pub options: Vec<String>,
    pub has_optional: bool,
}

impl TargetSummary {
    /// Parse the six-line summary.
    ///
    /// Lines are trimmed; boolean lines are true only when they read `true`.
    pub fn parse(text: &str) -> crate::Result<Self> {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        if lines.len() < SUMMARY_LINES {
            return Err(Error::template(format!(
                "Target summary has {} line(s), expected {}",
                lines.len(),
                SUMMARY_LINES
            )));
        }
        if lines[0].is_empty() {
            return Err(Error::template(
                "Target summary has no API name; the target operation was not found",
            ));
        }

        Ok(Self {
            api_name: lines[0].to_string(),
            has_body: lines[1] == "true",
            body_name: Some(lines[2])
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            body_required: lines[3] == "true",
            options: lines[4]
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty() && *o != OPTIONAL_ARGS_NAME)
                .map(str::to_string)
                .collect(),
            has_optional: lines[5] == "true",
        })
    }

    /// Read and parse a `parsed-target.txt`
    pub async fn read_from<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text).map_err(|e| {
            Error::template(format!("Invalid target summary {}: {}", path.display(), e))
        })
    }

    /// The record an adapter run reads for this target.
    ///
    /// Optional keys are only present when they carry information.
    pub fn to_descriptor(&self, target: &TargetRef) -> TargetDescriptor {
        let mut descriptor = TargetDescriptor::new();
        descriptor.insert("targetApiId", &target.api_id);
        descriptor.insert("targetFullId", target.full_id());
        descriptor.insert("targetApiPath", format!("../../../targets/{}", target.api_id));
        descriptor.insert("targetApiName", &self.api_name);
        descriptor.insert("targetFunctionName", camelize(&target.operation_id));
        if !self.options.is_empty() {
            descriptor.insert("targetOptions", self.options.join(", "));
        }
        if self.has_body {
            descriptor.insert("targetHasBody", "true");
        }
        if let Some(body_name) = &self.body_name {
            descriptor.insert("targetBodyName", body_name);
        }
        if self.has_optional {
            descriptor.insert("targetHasOptional", "true");
        }
        descriptor
    }
}

/// A target operation as requested by the orchestrator: `api_operation_response`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    pub api_id: String,
    pub operation_id: String,
    pub response_id: Option<String>,
}

impl TargetRef {
    /// Parse `api_operation` or `api_operation_response`.
    ///
    /// Only the first two underscores separate; the response id keeps any
    /// further ones.
    pub fn parse(id: &str) -> crate::Result<Self> {
        let mut parts = id.splitn(3, '_');
        let api_id = parts.next().unwrap_or_default();
        let operation_id = parts.next().unwrap_or_default();
        if api_id.is_empty() || operation_id.is_empty() {
            return Err(Error::config(format!(
                "Invalid target id '{}', expected <api>_<operation>[_<response>]",
                id
            )));
        }
        Ok(Self {
            api_id: api_id.to_string(),
            operation_id: operation_id.to_string(),
            response_id: parts.next().map(str::to_string),
        })
    }

    pub fn full_id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.api_id, self.operation_id)?;
        if let Some(response_id) = &self.response_id {
            write!(f, "_{}", response_id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_full_summary() {
        let summary = TargetSummary::parse("PetApi\ntrue\npet\ntrue\npetId, pet, opts\ntrue\n").unwrap();
        assert_eq!(
            summary,
            TargetSummary {
                api_name: "PetApi".into(),
                has_body: true,
                body_name: Some("pet".into()),
                body_required: true,
                options: vec!["petId".into(), "pet".into()],
                has_optional: true,
            }
        );
    }

    #[test]
    fn test_parse_without_body() {
        let summary = TargetSummary::parse("StoreApi\r\nfalse\r\n\r\nfalse\r\n\r\nfalse").unwrap();
        assert_eq!(summary.api_name, "StoreApi");
        assert!(!summary.has_body);
        assert_eq!(summary.body_name, None);
        assert!(summary.options.is_empty());
        assert!(!summary.has_optional);
    }

    #[test]
    fn test_parse_rejects_short_or_unresolved() {
        assert!(TargetSummary::parse("PetApi\ntrue\n").is_err());
        assert!(TargetSummary::parse("\nfalse\n\nfalse\n\nfalse\n").is_err());
    }

    #[tokio::test]
    async fn test_read_from() -> crate::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("parsed-target.txt");
        tokio::fs::write(&path, "PetApi\nfalse\n\nfalse\nopts\ntrue\n").await?;
        let summary = TargetSummary::read_from(&path).await?;
        assert!(summary.options.is_empty());
        assert!(summary.has_optional);

        assert!(TargetSummary::read_from(dir.path().join("missing.txt"))
            .await
            .is_err());
        Ok(())
    }

    #[test]
    fn test_target_ref() {
        let target = TargetRef::parse("petstore_getPetById_200").unwrap();
        assert_eq!(target.api_id, "petstore");
        assert_eq!(target.operation_id, "getPetById");
        assert_eq!(target.response_id.as_deref(), Some("200"));
        assert_eq!(target.full_id(), "petstore_getPetById_200");

        let target = TargetRef::parse("petstore_getPetById").unwrap();
        assert_eq!(target.response_id, None);
        assert_eq!(target.full_id(), "petstore_getPetById");

        assert_eq!(
            TargetRef::parse("a_b_c_d").unwrap().response_id.as_deref(),
            Some("c_d")
        );
        assert!(TargetRef::parse("petstore").is_err());
        assert!(TargetRef::parse("_op").is_err());
    }

    #[test]
    fn test_descriptor_keys() {
        let target = TargetRef::parse("petstore_getPetById_200").unwrap();
        let summary = TargetSummary::parse("PetApi\nfalse\n\nfalse\npetId, opts\ntrue\n").unwrap();
        let descriptor = summary.to_descriptor(&target);

        assert_eq!(descriptor.get("targetApiId"), Some("petstore"));
        assert_eq!(descriptor.get("targetFullId"), Some("petstore_getPetById_200"));
        assert_eq!(descriptor.get("targetApiPath"), Some("../../../targets/petstore"));
        assert_eq!(descriptor.get("targetApiName"), Some("PetApi"));
        assert_eq!(descriptor.get("targetFunctionName"), Some("getPetById"));
        assert_eq!(descriptor.get("targetOptions"), Some("petId"));
        assert_eq!(descriptor.get("targetHasOptional"), Some("true"));
        assert_eq!(descriptor.get("targetHasBody"), None);
        assert_eq!(descriptor.get("targetBodyName"), None);
        assert_eq!(descriptor.len(), 7);
    }

    #[test]
    fn test_descriptor_survives_transport() {
        let target = TargetRef::parse("petstore_addPet_201").unwrap();
        let summary = TargetSummary::parse("PetApi\ntrue\npet\ntrue\npet\nfalse\n").unwrap();
        let encoded = crate::decode::encode_targets(&[summary.to_descriptor(&target)]);

        let decoding = crate::decode::decode_targets(&encoded);
        assert!(decoding.errors.is_empty());
        assert_eq!(decoding.targets[0].get("targetBodyName"), Some("pet"));
        assert_eq!(decoding.targets[0].get("targetHasBody"), Some("true"));
    }
}

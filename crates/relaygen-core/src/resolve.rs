//! Resolution of the configured operation within the built operation sets.
//!
//! Both generator variants compare every descriptor id against the configured
//! `operationId` by exact equality. The adapter variant ([`SourceMarker`]) tags
//! each descriptor with a `source` vendor marker; the target variant
//! ([`TargetResolver`]) derives a [`ResolvedTarget`] from the first match of
//! the run. Ids are expected to be unique. When they are not, the target
//! variant keeps the first match in list order, the adapter variant marks
//! every equal descriptor, and the aggregate flag is set either way.
//!
//! Without an `operationId` both variants leave their input untouched.

use serde_json::Value as JsonValue;

use crate::hooks::OperationsHook;
use crate::operation::{BodyParam, OperationDescriptor, OperationSet};
use crate::properties::PropertyMap;

/// Vendor marker set on every descriptor by the adapter variant
pub const SOURCE_MARKER: &str = "source";

pub const TARGET_API_NAME: &str = "targetApiName";
pub const TARGET_BODY_EXISTS: &str = "targetBodyExists";
pub const TARGET_BODY_NAME: &str = "targetBodyName";
pub const TARGET_BODY_REQUIRED: &str = "targetBodyRequired";
pub const TARGET_HAS_OPTIONAL: &str = "targetHasOptional";
pub const TARGET_OPTIONS: &str = "targetOptions";

/// First descriptor in `set` whose id equals `operation_id`
pub fn find_operation<'a>(
    set: &'a OperationSet,
    operation_id: &str,
) -> Option<&'a OperationDescriptor> {
    set.operations.iter().find(|op| op.id == operation_id)
}

/// Tag every descriptor with [`SOURCE_MARKER`] and report whether any matched
pub fn mark_source(set: &mut OperationSet, operation_id: &str) -> bool {
    let mut contains = false;
    for op in &mut set.operations {
        let is_operation = op.id == operation_id;
        op.vendor_extensions
            .insert(SOURCE_MARKER.to_string(), JsonValue::Bool(is_operation));
        contains |= is_operation;
    }
    contains
}

/// Shape of the resolved target operation, as published to templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Display name of the enclosing API class
    pub api_name: String,
    pub body: Option<BodyParam>,
    pub has_optional: bool,
    /// Rendered argument list, e.g. `petId, opts`
    pub options: String,
}

impl ResolvedTarget {
    pub fn from_operation(api_name: &str, op: &OperationDescriptor) -> Self {
        Self {
            api_name: api_name.to_string(),
            body: op.body_param.clone(),
            has_optional: op.has_optional_params,
            options: op.arg_list_string(),
        }
    }

    /// Write the `target*` properties.
    ///
    /// `targetBodyName` and `targetBodyRequired` are only written when the
    /// operation has a body.
    pub fn write_to(&self, properties: &mut PropertyMap) {
        properties.insert(
            TARGET_API_NAME.to_string(),
            JsonValue::String(self.api_name.clone()),
        );
        properties.insert(
            TARGET_BODY_EXISTS.to_string(),
            JsonValue::Bool(self.body.is_some()),
        );
        if let Some(body) = &self.body {
            properties.insert(
                TARGET_BODY_NAME.to_string(),
                JsonValue::String(body.name.clone()),
            );
            properties.insert(
                TARGET_BODY_REQUIRED.to_string(),
                JsonValue::Bool(body.required),
            );
        }
        properties.insert(
            TARGET_HAS_OPTIONAL.to_string(),
            JsonValue::Bool(self.has_optional),
        );
        properties.insert(
            TARGET_OPTIONS.to_string(),
            JsonValue::String(self.options.clone()),
        );
    }
}

/// Adapter variant: marks the source operation in every set.
///
/// Unlike the target variant there is no first-match tie-break: when ids are
/// duplicated, every equal descriptor is marked `source = true`.
#[derive(Debug, Clone, Default)]
pub struct SourceMarker {
    operation_id: Option<String>,
}

impl SourceMarker {
    pub fn new(operation_id: Option<String>) -> Self {
        Self { operation_id }
    }
}

impl OperationsHook for SourceMarker {
    fn postprocess_operations(&mut self, set: &mut OperationSet) {
        let Some(operation_id) = self.operation_id.as_deref() else {
            return;
        };
        let contains = mark_source(set, operation_id);
        log::debug!(
            "{}: source operation '{}' {}",
            set.classname,
            operation_id,
            if contains { "found" } else { "not present" }
        );
        set.contains_operation = Some(contains);
    }

    fn publish(&self, _properties: &mut PropertyMap) {}
}

/// Target variant: derives the target call shape from the first match.
#[derive(Debug, Clone, Default)]
pub struct TargetResolver {
    operation_id: Option<String>,
    resolved: Option<ResolvedTarget>,
}

impl TargetResolver {
    pub fn new(operation_id: Option<String>) -> Self {
        Self {
            operation_id,
            resolved: None,
        }
    }

    pub fn resolved(&self) -> Option<&ResolvedTarget> {
        self.resolved.as_ref()
    }
}

impl OperationsHook for TargetResolver {
    fn postprocess_operations(&mut self, set: &mut OperationSet) {
        let Some(operation_id) = self.operation_id.as_deref() else {
            return;
        };
        let found = find_operation(set, operation_id);
        let contains = found.is_some();

        if let Some(op) = found.filter(|_| self.resolved.is_none()) {
            log::debug!("Resolved target '{}' in {}", operation_id, set.classname);
            self.resolved = Some(ResolvedTarget::from_operation(&set.classname, op));
        }
        set.contains_operation = Some(contains);
    }

    fn publish(&self, properties: &mut PropertyMap) {
        if let Some(resolved) = &self.resolved {
            resolved.write_to(properties);
        } else if let Some(operation_id) = &self.operation_id {
            log::warn!("Target operation '{}' not found", operation_id);
        }
    }

    fn resolved_target(&self) -> Option<&ResolvedTarget> {
        self.resolved()
    }
}

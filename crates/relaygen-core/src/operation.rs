//! Operation descriptors built by the host engine.
//!
//! Descriptors are language-agnostic and serialize in the camelCase shape the
//! templates read. The resolver only reads their structural fields and writes
//! into `vendor_extensions`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Name of the trailing argument that carries optional parameters
pub const OPTIONAL_ARGS_NAME: &str = "opts";

/// Body parameter of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BodyParam {
    /// Argument name used in generated code
    pub name: String,
    pub required: bool,
}

/// Non-body parameter of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    /// Argument name used in generated code
    pub name: String,
    /// Name as written in the API description
    pub base_name: String,
    /// One of `path`, `query`, `header`, `cookie`
    pub location: String,
    pub required: bool,
}

/// One API operation as the generator sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    #[serde(rename = "operationId")]
    pub id: String,
    /// Upper-case HTTP method
    pub method: String,
    pub path: String,
    pub summary: Option<String>,
    pub parameters: Vec<ParameterDescriptor>,
    pub body_param: Option<BodyParam>,
    /// Whether any parameter or the body is optional
    pub has_optional_params: bool,
    /// Positional argument names of the generated client call
    pub arg_list: Vec<String>,
    /// Derived annotations for templates
    pub vendor_extensions: BTreeMap<String, JsonValue>,
}

impl OperationDescriptor {
    pub fn new(id: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method: method.into().to_uppercase(),
            path: path.into(),
            summary: None,
            parameters: Vec::new(),
            body_param: None,
            has_optional_params: false,
            arg_list: Vec::new(),
            vendor_extensions: BTreeMap::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self.derive_arguments();
        self
    }

    pub fn with_body(mut self, name: impl Into<String>, required: bool) -> Self {
        self.body_param = Some(BodyParam {
            name: name.into(),
            required,
        });
        self.derive_arguments();
        self
    }

    /// Recompute `has_optional_params` and `arg_list` from parameters and body.
    ///
    /// Required parameters come first in declaration order, then a required
    /// body, then [`OPTIONAL_ARGS_NAME`] when anything is optional.
    pub fn derive_arguments(&mut self) {
        let body_optional = self.body_param.as_ref().is_some_and(|b| !b.required);
        self.has_optional_params = body_optional || self.parameters.iter().any(|p| !p.required);

        let mut args: Vec<String> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.clone())
            .collect();
        if let Some(body) = self.body_param.as_ref().filter(|b| b.required) {
            args.push(body.name.clone());
        }
        if self.has_optional_params {
            args.push(OPTIONAL_ARGS_NAME.to_string());
        }
        self.arg_list = args;
    }

    /// Argument list as it appears in the generated call, e.g. `petId, opts`
    pub fn arg_list_string(&self) -> String {
        self.arg_list.join(", ")
    }
}

/// Operations the host groups under one API class
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSet {
    /// Display name of the API class, e.g. `PetApi`
    pub classname: String,
    pub operations: Vec<OperationDescriptor>,
    /// Whether the configured operation occurs in this set; unset when no
    /// operation was configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains_operation: Option<bool>,
}

impl OperationSet {
    pub fn new(classname: impl Into<String>, operations: Vec<OperationDescriptor>) -> Self {
        Self {
            classname: classname.into(),
            operations,
            contains_operation: None,
        }
    }
}

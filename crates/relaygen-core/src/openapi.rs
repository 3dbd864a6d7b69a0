//! OpenAPI specification loading and operation set construction.
//!
//! This module loads OpenAPI (3.x) and Swagger (2.0) documents from files or
//! URLs and turns their `paths` into the [`OperationSet`]s the generators
//! post-process. Operations are grouped by their first tag into API classes
//! (`pet` becomes `PetApi`, untagged operations land in `DefaultApi`).
//!
//! # Examples
//!
//! ```no_run
//! use relaygen_core::openapi::OpenApiContext;
//! use relaygen_core::error::Result;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let spec = OpenApiContext::from_file("openapi.json").await?;
//!
//! for set in spec.parse_operation_sets()? {
//!     println!("{}: {} operation(s)", set.classname, set.operations.len());
//! }
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::path::Path;

use crate::operation::{BodyParam, OperationDescriptor, OperationSet, ParameterDescriptor};
use crate::utils::{camelize, to_lower_camel_case, to_upper_camel_case};
use crate::Error;

// External imports (alphabetized)
use serde_json::{Map as JsonMap, Value as JsonValue};
use tokio::fs;

/// HTTP methods of a path item, in the order operations are collected
const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Tag used for operations that declare none
const DEFAULT_TAG: &str = "default";

/// Represents an OpenAPI specification
#[derive(Debug, serde::Serialize)]
#[serde(transparent)]
pub struct OpenApiContext {
    /// The raw JSON value of the OpenAPI spec
    pub json: JsonValue,
}

impl OpenApiContext {
    /// Wrap an already parsed document
    pub fn new(json: JsonValue) -> Self {
        Self { json }
    }

    /// Create a new OpenApiContext from a file or URL (supports both YAML and JSON)
    pub async fn from_file_or_url<P: AsRef<str>>(location: P) -> crate::Result<Self> {
        let location = location.as_ref();

        if location.starts_with("http://") || location.starts_with("https://") {
            return Self::from_url(location).await;
        }

        Self::from_file(location).await
    }

    /// Create a new OpenApiContext from a file (supports both YAML and JSON)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        Self::parse_content(&content).map_err(|e| {
            Error::openapi(format!(
                "Failed to parse OpenAPI spec at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Create a new OpenApiContext from a URL (supports both YAML and JSON)
    pub async fn from_url(url: &str) -> crate::Result<Self> {
        let response = reqwest::get(url).await.map_err(|e| {
            Error::openapi(format!("Failed to fetch OpenAPI spec from {}: {}", url, e))
        })?;

        if !response.status().is_success() {
            return Err(Error::openapi(format!(
                "Failed to fetch OpenAPI spec from {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let content = response.text().await.map_err(|e| {
            Error::openapi(format!("Failed to read response from {}: {}", url, e))
        })?;

        Self::parse_content(&content).map_err(|e| {
            Error::openapi(format!("Failed to parse OpenAPI spec from {}: {}", url, e))
        })
    }

    /// Parse content as either JSON or YAML
    fn parse_content(content: &str) -> Result<Self, String> {
        if let Ok(json) = serde_json::from_str(content) {
            return Ok(Self { json });
        }

        if let Ok(json) = serde_yaml::from_str(content) {
            return Ok(Self { json });
        }

        Err("content is neither valid JSON nor YAML".to_string())
    }

    /// Get the title of the API
    pub fn title(&self) -> Option<&str> {
        self.json.get("info")?.get("title")?.as_str()
    }

    /// Get the version of the API
    pub fn version(&self) -> Option<&str> {
        self.json.get("info")?.get("version")?.as_str()
    }

    /// Get the base path of the API
    pub fn base_path(&self) -> Option<String> {
        // OpenAPI 3.0+ servers
        if let Some(url) = self
            .json
            .get("servers")
            .and_then(JsonValue::as_array)
            .and_then(|servers| servers.first())
            .and_then(|server| server.get("url"))
            .and_then(JsonValue::as_str)
        {
            return Some(url.to_string());
        }

        // Swagger 2.0 host + basePath
        let host = self.json.get("host").and_then(JsonValue::as_str)?;
        let base_path = self
            .json
            .get("basePath")
            .and_then(JsonValue::as_str)
            .unwrap_or("");
        let schemes = self.json.get("schemes").and_then(JsonValue::as_array);
        let scheme = match schemes {
            Some(schemes) if schemes.iter().any(|s| s.as_str() == Some("https")) => "https",
            Some(schemes) => schemes.first().and_then(JsonValue::as_str).unwrap_or("https"),
            None => "https",
        };
        Some(format!("{}://{}{}", scheme, host, base_path))
    }

    /// Build the operation sets the generators post-process.
    ///
    /// Paths are walked in document order and methods in [`METHODS`] order.
    /// Sets appear in the order their tag is first seen.
    pub fn parse_operation_sets(&self) -> crate::Result<Vec<OperationSet>> {
        let paths = self
            .json
            .get("paths")
            .and_then(JsonValue::as_object)
            .ok_or_else(|| Error::openapi("Missing 'paths' object"))?;

        let mut sets: Vec<OperationSet> = Vec::new();
        for (path, item) in paths {
            for method in METHODS {
                let Some(operation) = item.get(method).and_then(JsonValue::as_object) else {
                    continue;
                };
                let descriptor = self.build_operation(path, method, item, operation)?;

                let tag = operation
                    .get("tags")
                    .and_then(JsonValue::as_array)
                    .and_then(|tags| tags.first())
                    .and_then(JsonValue::as_str)
                    .unwrap_or(DEFAULT_TAG);
                let classname = format!("{}Api", to_upper_camel_case(tag));

                match sets.iter_mut().find(|s| s.classname == classname) {
                    Some(set) => set.operations.push(descriptor),
                    None => sets.push(OperationSet::new(classname, vec![descriptor])),
                }
            }
        }

        log::debug!(
            "Built {} operation set(s): {}",
            sets.len(),
            sets.iter()
                .map(|s| s.classname.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(sets)
    }

    fn build_operation(
        &self,
        path: &str,
        method: &str,
        path_item: &JsonValue,
        operation: &JsonMap<String, JsonValue>,
    ) -> crate::Result<OperationDescriptor> {
        let id = match operation.get("operationId").and_then(JsonValue::as_str) {
            Some(id) => camelize(id),
            None => to_lower_camel_case(&format!("{} {}", method, path)),
        };

        let mut descriptor = OperationDescriptor::new(id, method, path);
        descriptor.summary = operation
            .get("summary")
            .and_then(JsonValue::as_str)
            .map(String::from);

        for param in self.merged_parameters(path_item, operation)? {
            let Some(base_name) = param.get("name").and_then(JsonValue::as_str) else {
                continue;
            };
            let location = param.get("in").and_then(JsonValue::as_str).unwrap_or("query");
            let required = param
                .get("required")
                .and_then(JsonValue::as_bool)
                .unwrap_or(location == "path");

            if location == "body" {
                descriptor.body_param = Some(BodyParam {
                    name: to_lower_camel_case(base_name),
                    required,
                });
            } else {
                descriptor.parameters.push(ParameterDescriptor {
                    name: to_lower_camel_case(base_name),
                    base_name: base_name.to_string(),
                    location: location.to_string(),
                    required,
                });
            }
        }

        if let Some(request_body) = operation.get("requestBody") {
            descriptor.body_param = Some(self.request_body_param(request_body)?);
        }

        descriptor.derive_arguments();
        Ok(descriptor)
    }

    /// Path-level parameters followed by operation-level ones; an operation
    /// parameter replaces a path parameter with the same name and location.
    fn merged_parameters<'a>(
        &'a self,
        path_item: &'a JsonValue,
        operation: &'a JsonMap<String, JsonValue>,
    ) -> crate::Result<Vec<&'a JsonValue>> {
        let mut merged: Vec<&JsonValue> = Vec::new();
        let levels = [path_item.get("parameters"), operation.get("parameters")];
        for list in levels.into_iter().flatten().filter_map(JsonValue::as_array) {
            for param in list {
                let param = self.resolve_ref(param)?;
                let key = (param.get("name"), param.get("in"));
                match merged
                    .iter_mut()
                    .find(|p| (p.get("name"), p.get("in")) == key)
                {
                    Some(existing) => *existing = param,
                    None => merged.push(param),
                }
            }
        }
        Ok(merged)
    }

    fn request_body_param(&self, request_body: &JsonValue) -> crate::Result<BodyParam> {
        let request_body = self.resolve_ref(request_body)?;
        let required = request_body
            .get("required")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);

        let schema_name = request_body
            .get("content")
            .and_then(JsonValue::as_object)
            .and_then(|content| content.values().next())
            .and_then(|media| media.get("schema"))
            .and_then(|schema| schema.get("$ref"))
            .and_then(JsonValue::as_str)
            .and_then(|r| r.rsplit('/').next());

        let name = match schema_name {
            Some(schema_name) => to_lower_camel_case(schema_name),
            None => "body".to_string(),
        };
        Ok(BodyParam { name, required })
    }

    /// Follow a local `$ref`, or return the value itself when it has none
    fn resolve_ref<'a>(&'a self, value: &'a JsonValue) -> crate::Result<&'a JsonValue> {
        let Some(reference) = value.get("$ref").and_then(JsonValue::as_str) else {
            return Ok(value);
        };
        reference
            .strip_prefix('#')
            .and_then(|pointer| self.json.pointer(pointer))
            .ok_or_else(|| Error::openapi(format!("Unresolvable reference '{}'", reference)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn petstore() -> OpenApiContext {
        OpenApiContext::new(json!({
            "openapi": "3.0.0",
            "info": { "title": "Petstore", "version": "1.0.0" },
            "servers": [{ "url": "https://petstore.example.com/v1" }],
            "paths": {
                "/pet/{petId}": {
                    "parameters": [
                        { "name": "petId", "in": "path", "schema": { "type": "integer" } }
                    ],
                    "get": {
                        "operationId": "getPet",
                        "tags": ["pet"],
                        "parameters": [
                            { "$ref": "#/components/parameters/Verbose" }
                        ]
                    },
                    "delete": {
                        "operationId": "delete_pet",
                        "tags": ["pet"]
                    }
                },
                "/pet": {
                    "post": {
                        "operationId": "createPet",
                        "tags": ["pet"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/Pet" }
                                }
                            }
                        }
                    }
                },
                "/store/order": {
                    "post": {
                        "tags": ["store"],
                        "requestBody": { "$ref": "#/components/requestBodies/Order" }
                    }
                },
                "/health": {
                    "get": { "operationId": "health" }
                }
            },
            "components": {
                "parameters": {
                    "Verbose": { "name": "verbose", "in": "query", "schema": { "type": "boolean" } }
                },
                "requestBodies": {
                    "Order": {
                        "content": {
                            "application/json": { "schema": { "type": "object" } }
                        }
                    }
                },
                "schemas": {
                    "Pet": { "type": "object" }
                }
            }
        }))
    }

    #[tokio::test]
    async fn test_from_file_yaml() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("openapi.yaml");
        let yaml = "openapi: 3.0.0\ninfo:\n  title: Test API\n  version: 2.0.0\npaths: {}\n";
        tokio::fs::write(&file_path, yaml).await?;

        let spec = OpenApiContext::from_file(&file_path).await?;
        assert_eq!(spec.title(), Some("Test API"));
        assert_eq!(spec.version(), Some("2.0.0"));
        assert!(spec.parse_operation_sets()?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_from_file_rejects_garbage() -> crate::Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("broken.json");
        tokio::fs::write(&file_path, "{ not: [valid").await?;

        let err = OpenApiContext::from_file(&file_path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse OpenAPI spec"));
        Ok(())
    }

    #[test]
    fn test_base_path_swagger2() {
        let spec = OpenApiContext::new(json!({
            "swagger": "2.0",
            "host": "api.example.com",
            "basePath": "/v2",
            "schemes": ["http", "https"]
        }));
        assert_eq!(spec.base_path(), Some("https://api.example.com/v2".to_string()));
        assert_eq!(
            petstore().base_path(),
            Some("https://petstore.example.com/v1".to_string())
        );
    }

    #[test]
    fn test_missing_paths() {
        let spec = OpenApiContext::new(json!({"openapi": "3.0.0"}));
        assert!(spec.parse_operation_sets().is_err());
    }

    #[test]
    fn test_groups_by_first_tag() -> crate::Result<()> {
        let sets = petstore().parse_operation_sets()?;
        let names: Vec<_> = sets.iter().map(|s| s.classname.as_str()).collect();
        assert_eq!(names, vec!["PetApi", "StoreApi", "DefaultApi"]);

        let pet_ids: Vec<_> = sets[0].operations.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(pet_ids, vec!["getPet", "deletePet", "createPet"]);
        Ok(())
    }

    #[test]
    fn test_merges_path_and_operation_parameters() -> crate::Result<()> {
        let sets = petstore().parse_operation_sets()?;
        let get_pet = &sets[0].operations[0];
        assert_eq!(get_pet.method, "GET");
        let names: Vec<_> = get_pet.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["petId", "verbose"]);
        assert!(get_pet.parameters[0].required);
        assert!(!get_pet.parameters[1].required);
        assert!(get_pet.has_optional_params);
        assert_eq!(get_pet.arg_list_string(), "petId, opts");
        Ok(())
    }

    #[test]
    fn test_request_body_named_after_schema() -> crate::Result<()> {
        let sets = petstore().parse_operation_sets()?;
        let create = &sets[0].operations[2];
        assert_eq!(
            create.body_param,
            Some(BodyParam {
                name: "pet".to_string(),
                required: true
            })
        );
        assert_eq!(create.arg_list_string(), "pet");

        let order = &sets[1].operations[0];
        assert_eq!(order.id, "postStoreOrder");
        assert_eq!(
            order.body_param,
            Some(BodyParam {
                name: "body".to_string(),
                required: false
            })
        );
        assert_eq!(order.arg_list_string(), "opts");
        Ok(())
    }

    #[test]
    fn test_swagger2_body_parameter() -> crate::Result<()> {
        let spec = OpenApiContext::new(json!({
            "swagger": "2.0",
            "paths": {
                "/user": {
                    "post": {
                        "operationId": "createUser",
                        "parameters": [
                            { "name": "User", "in": "body", "required": true, "schema": {} },
                            { "name": "X-Trace", "in": "header" }
                        ]
                    }
                }
            }
        }));
        let sets = spec.parse_operation_sets()?;
        let op = &sets[0].operations[0];
        assert_eq!(op.body_param.as_ref().map(|b| b.name.as_str()), Some("user"));
        assert_eq!(op.parameters.len(), 1);
        assert_eq!(op.parameters[0].name, "xTrace");
        assert_eq!(op.parameters[0].base_name, "X-Trace");
        assert_eq!(op.arg_list, vec!["user", "opts"]);
        Ok(())
    }

    #[test]
    fn test_operation_ids_keep_inner_capitals() -> crate::Result<()> {
        let spec = OpenApiContext::new(json!({
            "paths": {
                "/pet/{id}": { "get": { "operationId": "getPetByID" } },
                "/raw": { "get": { "operationId": "HTTPResponse" } },
                "/order": { "post": { "operationId": "place_order" } }
            }
        }));
        let sets = spec.parse_operation_sets()?;
        let ids: Vec<_> = sets[0].operations.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["getPetByID", "hTTPResponse", "placeOrder"]);
        Ok(())
    }

    #[test]
    fn test_unresolvable_reference() {
        let spec = OpenApiContext::new(json!({
            "paths": {
                "/x": { "get": { "parameters": [{ "$ref": "#/components/parameters/Nope" }] } }
            }
        }));
        let err = spec.parse_operation_sets().unwrap_err();
        assert!(err.to_string().contains("#/components/parameters/Nope"));
    }
}

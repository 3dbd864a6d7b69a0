//! Relaygen Core Library
//!
//! This library generates adapter and target glue code from OpenAPI
//! descriptions. An adapter run receives the adapter's source operation, its
//! targets and its request and response mappings as base64 transported
//! generator properties, decodes them, and marks the source operation in the
//! built operation sets. A target run locates one target operation and
//! publishes how to call it.

pub mod config;
pub mod decode;
pub mod error;
pub mod generate;
pub mod generator;
pub mod hooks;
pub mod manifest;
pub mod openapi;
pub mod operation;
pub mod properties;
pub mod resolve;
pub mod summary;
pub mod templates;
pub mod utils;

pub use crate::{
    config::Config,
    decode::{
        ConfigurationDecoder, DecodedConfig, MappingExpression, SegmentPolicy, TargetDescriptor,
        decode_mapping, decode_targets, encode_mapping, encode_targets,
    },
    error::{DecodeError, Error, Result},
    generate::generate,
    generator::{Generator, GeneratorKind},
    hooks::{OperationsHook, PreprocessHook},
    openapi::OpenApiContext,
    operation::{OperationDescriptor, OperationSet},
    properties::{GenerationProperties, PropertyMap, parse_additional_properties},
    resolve::{ResolvedTarget, SourceMarker, TargetResolver},
    summary::{TargetRef, TargetSummary},
    templates::{GenerationReport, TemplateDir, TemplateManager},
};

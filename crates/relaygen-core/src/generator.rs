//! Generator kinds and the per-run pipeline they share.
//!
//! A [`Generator`] wires the configuration decoder and the kind's operations
//! hook together in the order the host engine calls them:
//!
//! 1. decode the generator properties,
//! 2. let the host build its operation sets,
//! 3. post-process every set,
//! 4. publish run-level results into the template properties.
//!
//! # Examples
//!
//! ```
//! use relaygen_core::generator::GeneratorKind;
//!
//! let kind: GeneratorKind = "javascript-target".parse().unwrap();
//! assert_eq!(kind, GeneratorKind::Target);
//! assert_eq!(kind.to_string(), "target");
//! ```

// Internal imports (std, crate)
use std::fmt;
use std::str::FromStr;

use crate::decode::{ConfigurationDecoder, DecodedConfig, SegmentPolicy};
use crate::error::DecodeError;
use crate::hooks::{OperationsHook, PreprocessHook};
use crate::operation::OperationSet;
use crate::properties::{GenerationProperties, PropertyMap};
use crate::resolve::{ResolvedTarget, SourceMarker, TargetResolver};

/// Supported generator kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeneratorKind {
    /// Glue code forwarding the source operation to its targets
    #[default]
    Adapter,
    /// Client call for one target operation
    Target,
}

impl FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adapter" | "javascript-adapter" => Ok(GeneratorKind::Adapter),
            "target" | "javascript-target" => Ok(GeneratorKind::Target),
            _ => Err(format!("Unknown generator kind: {}", s)),
        }
    }
}

impl GeneratorKind {
    /// Returns the generator identifier, also the name of its template directory
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adapter => "adapter",
            Self::Target => "target",
        }
    }

    /// Returns an iterator over all generator kinds
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::Adapter, Self::Target].into_iter()
    }

    /// Files rendered in addition to the template manifest's own
    pub fn supporting_files(&self) -> &'static [SupportingFile] {
        match self {
            Self::Adapter => &[],
            Self::Target => &[SupportingFile {
                template: "parsed-target.txt.tera",
                destination: "parsed-target.txt",
            }],
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A template a generator kind always renders, relative to its template and
/// output directories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportingFile {
    pub template: &'static str,
    pub destination: &'static str,
}

/// Everything one run produced before rendering
#[derive(Debug)]
pub struct GenerationRun {
    /// Decoded and decorated template properties
    pub properties: PropertyMap,
    /// Operation sets after post-processing
    pub operation_sets: Vec<OperationSet>,
    /// `targets` segments that were skipped
    pub diagnostics: Vec<DecodeError>,
    /// Target call shape, for the target kind when the operation was found
    pub resolved: Option<ResolvedTarget>,
}

/// Pipeline for one generator kind
#[derive(Debug, Clone, Copy)]
pub struct Generator {
    kind: GeneratorKind,
    decoder: ConfigurationDecoder,
}

impl Generator {
    pub fn new(kind: GeneratorKind, policy: SegmentPolicy) -> Self {
        Self {
            kind,
            decoder: ConfigurationDecoder::new(policy),
        }
    }

    pub fn kind(&self) -> GeneratorKind {
        self.kind
    }

    /// The post-processing hook for this kind
    pub fn operations_hook(&self, operation_id: Option<String>) -> Box<dyn OperationsHook> {
        match self.kind {
            GeneratorKind::Adapter => Box::new(SourceMarker::new(operation_id)),
            GeneratorKind::Target => Box::new(TargetResolver::new(operation_id)),
        }
    }

    /// Run one generation invocation.
    ///
    /// `build_sets` stands in for the host engine building its operation
    /// sets; it runs after decoding and may read the decoded configuration.
    pub fn run<F>(
        &self,
        properties: GenerationProperties,
        build_sets: F,
    ) -> crate::Result<GenerationRun>
    where
        F: FnOnce(&DecodedConfig) -> crate::Result<Vec<OperationSet>>,
    {
        let mut decoded = self.decoder.preprocess(properties)?;
        let diagnostics = std::mem::take(&mut decoded.diagnostics);

        let mut operation_sets = build_sets(&decoded)?;
        let mut hook = self.operations_hook(decoded.operation_id.clone());
        for set in &mut operation_sets {
            hook.postprocess_operations(set);
        }

        let mut properties = decoded.into_properties();
        hook.publish(&mut properties);

        Ok(GenerationRun {
            properties,
            operation_sets,
            diagnostics,
            resolved: hook.resolved_target().cloned(),
        })
    }
}

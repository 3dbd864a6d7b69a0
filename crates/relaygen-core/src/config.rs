//! Configuration management for Relaygen code generation.
//!
//! A [`Config`] describes one generator invocation: which generator kind to
//! run, against which API description, into which directory, and with which
//! additional properties. It can be built programmatically or loaded from a
//! YAML file; CLI flags override file values.
//!
//! # Examples
//!
//! ```no_run
//! use relaygen_core::config::Config;
//!
//! # async fn example() -> relaygen_core::Result<()> {
//! let mut config = Config::new("petstore", "openapi.yaml", "out");
//! config.generator = "target".to_string();
//! config.properties.insert("operationId".into(), "getPetById".into());
//!
//! // Or load from a config file
//! let config = Config::from_file("relaygen.yaml").await?;
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::collections::BTreeMap;
use std::path::Path;

use crate::decode::SegmentPolicy;
use crate::generator::GeneratorKind;
use crate::properties::PropertyMap;
use crate::Error;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::fs;
use url::Url;

/// Configuration for one generator run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project name
    pub project_name: String,

    /// Path or URL of the OpenAPI description
    pub openapi_schema_path: String,

    /// Output directory for generated code
    pub output_dir: String,

    /// Generator kind to run
    #[serde(default = "default_generator")]
    pub generator: String,

    /// Optional path to template directory
    #[serde(default)]
    pub template_dir: Option<String>,

    /// Additional properties handed to the generator, e.g. `operationId`
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    /// Fail the run on the first undecodable `targets` segment
    #[serde(default)]
    pub strict_targets: bool,

    /// Base URL for API descriptions with a relative server URL
    #[serde(default)]
    pub base_url: Option<Url>,
}

impl Config {
    /// Create a new Config with default values
    pub fn new(
        project_name: impl Into<String>,
        openapi_schema_path: impl Into<String>,
        output_dir: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            openapi_schema_path: openapi_schema_path.into(),
            output_dir: output_dir.into(),
            generator: default_generator(),
            template_dir: None,
            properties: BTreeMap::new(),
            strict_targets: false,
            base_url: None,
        }
    }

    /// Load configuration from a file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// The configured generator kind
    pub fn generator_kind(&self) -> crate::Result<GeneratorKind> {
        self.generator.parse::<GeneratorKind>().map_err(Error::config)
    }

    pub fn segment_policy(&self) -> SegmentPolicy {
        if self.strict_targets {
            SegmentPolicy::Strict
        } else {
            SegmentPolicy::Skip
        }
    }

    /// Additional properties as the map a run starts from
    pub fn property_map(&self) -> PropertyMap {
        self.properties
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect()
    }
}

fn default_generator() -> String {
    GeneratorKind::default().as_str().to_string()
}

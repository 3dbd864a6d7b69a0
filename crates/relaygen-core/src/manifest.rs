//! Manifest file format for generator templates.
//!
//! Each generator kind's template directory may carry a `manifest.yaml` (or
//! `manifest.toml`) listing the files to render. Without a manifest nothing
//! but the kind's supporting files is rendered.
//!
//! ```yaml
//! name: adapter
//! description: Adapter glue for a source operation
//! version: 0.1.0
//! language: javascript
//! files:
//!   - source: index.js.tera
//!     destination: index.js
//!   - source: api.js.tera
//!     destination: "api/{classname}.js"
//!     for_each: api
//! ```

// Internal imports (std, crate)
use std::path::Path;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::fs;

use crate::Error;

/// Placeholder replaced with the set's class name in `for_each: api`
/// destinations
pub const CLASSNAME_PLACEHOLDER: &str = "{classname}";

/// The root manifest structure for a template directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateManifest {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Language of the generated code, e.g. "javascript"
    #[serde(default)]
    pub language: String,

    #[serde(default)]
    pub files: Vec<TemplateFile>,
}

/// Describes a single file to be generated from a template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateFile {
    /// Template path, relative to the template directory
    pub source: String,

    /// Output path, relative to the output directory
    pub destination: String,

    /// Render once per item instead of once per run
    #[serde(default)]
    pub for_each: Option<ForEach>,

    /// Extra values merged into the render context
    #[serde(default)]
    pub context: JsonValue,
}

/// Repetition directive for a template file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForEach {
    /// One file per operation set
    Api,
}

impl Default for TemplateManifest {
    fn default() -> Self {
        Self {
            name: String::from("default"),
            description: String::new(),
            version: default_version(),
            language: String::new(),
            files: Vec::new(),
        }
    }
}

impl TemplateFile {
    /// Destination for one operation set
    pub fn destination_for(&self, classname: &str) -> String {
        self.destination.replace(CLASSNAME_PLACEHOLDER, classname)
    }
}

impl TemplateManifest {
    /// Load the manifest of `template_dir`, trying YAML first, then TOML.
    ///
    /// Returns the default (empty) manifest when neither file exists.
    pub async fn load_from_dir(template_dir: &Path) -> crate::Result<Self> {
        let yaml_path = template_dir.join("manifest.yaml");
        let toml_path = template_dir.join("manifest.toml");

        if fs::try_exists(&yaml_path).await? {
            log::debug!("Loading manifest from {}", yaml_path.display());
            let content = fs::read_to_string(&yaml_path).await?;
            return serde_yaml::from_str(&content).map_err(|e| {
                Error::template(format!(
                    "Invalid template manifest at {}: {}",
                    yaml_path.display(),
                    e
                ))
            });
        }

        if fs::try_exists(&toml_path).await? {
            log::debug!("Loading manifest from {}", toml_path.display());
            let content = fs::read_to_string(&toml_path).await?;
            return toml::from_str(&content).map_err(|e| {
                Error::template(format!(
                    "Invalid template manifest at {}: {}",
                    toml_path.display(),
                    e
                ))
            });
        }

        log::debug!("No manifest in {}, using defaults", template_dir.display());
        Ok(Self::default())
    }
}

fn default_version() -> String {
    "0.1.0".to_string()
}

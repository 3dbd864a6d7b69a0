//! Loading and rendering of a generator kind's templates

// Internal imports (std, crate)
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    config::Config,
    error::{DecodeError, Error, Result},
    generator::{GenerationRun, GeneratorKind},
    manifest::{ForEach, TemplateFile, TemplateManifest},
    openapi::OpenApiContext,
    operation::OperationSet,
    properties::PropertyMap,
    resolve::ResolvedTarget,
};

use super::TemplateDir;

// External imports (alphabetized)
use serde_json::{json, Value as JsonValue};
use tera::{Context, Tera};

/// Outcome of one generation run
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Files written, in render order
    pub files: Vec<PathBuf>,
    /// `targets` segments skipped while decoding
    pub diagnostics: Vec<DecodeError>,
    /// Target call shape, for target runs that found the operation
    pub resolved: Option<ResolvedTarget>,
}

/// Manages loading and rendering of code generation templates
#[derive(Debug, Clone)]
pub struct TemplateManager {
    tera: Arc<Tera>,
    template_dir: TemplateDir,
    manifest: TemplateManifest,
}

impl TemplateManager {
    /// Create a TemplateManager for `kind`.
    ///
    /// `template_dir` may point at the template root or at the kind's own
    /// directory; when `None` the standard locations are searched.
    pub async fn new(kind: GeneratorKind, template_dir: Option<PathBuf>) -> Result<Self> {
        let template_dir = TemplateDir::discover(kind, template_dir.as_deref())?;
        let template_path = template_dir.template_path();
        let template_dir_str = template_path
            .to_str()
            .ok_or_else(|| Error::template("Template path contains invalid UTF-8"))?;

        let manifest = TemplateManifest::load_from_dir(template_path).await?;
        let tera = Tera::new(&format!("{}/**/*.tera", template_dir_str))?;
        log::debug!(
            "Loaded {} template(s) from {}",
            tera.get_template_names().count(),
            template_dir.display()
        );

        Ok(Self {
            tera: Arc::new(tera),
            template_dir,
            manifest,
        })
    }

    pub fn kind(&self) -> GeneratorKind {
        self.template_dir.kind()
    }

    pub fn template_dir(&self) -> &TemplateDir {
        &self.template_dir
    }

    pub fn manifest(&self) -> &TemplateManifest {
        &self.manifest
    }

    /// Check if a template exists
    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template(name).is_ok()
    }

    /// Manifest files whose template is loaded, as `(source, destination)`
    pub fn list_templates(&self) -> Vec<(String, String)> {
        self.manifest
            .files
            .iter()
            .filter(|f| self.has_template(&f.source))
            .map(|f| (f.source.clone(), f.destination.clone()))
            .collect()
    }

    /// Render every manifest and supporting file for a finished run
    pub async fn generate(
        &self,
        spec: &OpenApiContext,
        config: &Config,
        run: GenerationRun,
    ) -> Result<GenerationReport> {
        let output_dir = Path::new(&config.output_dir);
        tokio::fs::create_dir_all(output_dir).await?;

        let base_context = self.build_context(spec, config, &run)?;
        let mut files = Vec::new();

        for file in &self.manifest.files {
            match file.for_each {
                Some(ForEach::Api) => {
                    for set in &run.operation_sets {
                        let context = api_context(&base_context, file, set)?;
                        let dest = output_dir.join(file.destination_for(&set.classname));
                        self.render_to(&file.source, &context, &dest).await?;
                        files.push(dest);
                    }
                }
                None => {
                    let context = file_context(&base_context, file);
                    let dest = output_dir.join(&file.destination);
                    self.render_to(&file.source, &context, &dest).await?;
                    files.push(dest);
                }
            }
        }

        for supporting in self.kind().supporting_files() {
            let dest = output_dir.join(supporting.destination);
            self.render_to(supporting.template, &base_context, &dest)
                .await?;
            files.push(dest);
        }

        log::info!(
            "Generated {} file(s) in {}",
            files.len(),
            output_dir.display()
        );

        Ok(GenerationReport {
            files,
            diagnostics: run.diagnostics,
            resolved: run.resolved,
        })
    }

    /// Context shared by every file of the run
    fn build_context(
        &self,
        spec: &OpenApiContext,
        config: &Config,
        run: &GenerationRun,
    ) -> Result<PropertyMap> {
        let mut context = run.properties.clone();

        context.insert("projectName".to_string(), json!(config.project_name));
        if let Some(title) = spec.title() {
            context.insert("projectTitle".to_string(), json!(title));
        }
        if let Some(version) = spec.version() {
            context.insert("apiVersion".to_string(), json!(version));
        }
        if let Some(url) = base_api_url(spec, config)? {
            context.insert("baseApiUrl".to_string(), json!(url));
        }
        context.insert("generator".to_string(), json!(self.kind().as_str()));
        context.insert("apis".to_string(), serde_json::to_value(&run.operation_sets)?);

        log::debug!(
            "Template context keys: {}",
            context.keys().cloned().collect::<Vec<_>>().join(", ")
        );
        Ok(context)
    }

    async fn render_to(&self, template: &str, context: &PropertyMap, dest: &Path) -> Result<()> {
        if !self.has_template(template) {
            return Err(Error::template(format!(
                "Template not found: {} in {}",
                template,
                self.template_dir.display()
            )));
        }

        let tera_context = Context::from_value(JsonValue::Object(context.clone()))?;
        let content = self.tera.render(template, &tera_context).map_err(|e| {
            log::error!("Template rendering failed for '{}': {:?}", template, e);
            Error::template(format!("Failed to render template '{}': {}", template, e))
        })?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, content).await?;
        log::debug!("Rendered {} -> {}", template, dest.display());
        Ok(())
    }
}

/// Base context plus the manifest entry's own values
fn file_context(base: &PropertyMap, file: &TemplateFile) -> PropertyMap {
    let mut context = base.clone();
    if let JsonValue::Object(extra) = &file.context {
        context.extend(extra.clone());
    }
    context
}

/// File context plus the fields of one operation set
fn api_context(base: &PropertyMap, file: &TemplateFile, set: &OperationSet) -> Result<PropertyMap> {
    let mut context = file_context(base, file);
    if let JsonValue::Object(fields) = serde_json::to_value(set)? {
        context.extend(fields);
    }
    context
        .entry("containsOperation")
        .or_insert(JsonValue::Bool(false));
    Ok(context)
}

/// Server URL of the document, made absolute with `config.base_url` when it
/// is relative
fn base_api_url(spec: &OpenApiContext, config: &Config) -> Result<Option<String>> {
    let Some(spec_url) = spec.base_path() else {
        return Ok(config.base_url.as_ref().map(|u| u.to_string()));
    };

    if spec_url.starts_with("http://") || spec_url.starts_with("https://") {
        return Ok(Some(spec_url));
    }

    match &config.base_url {
        Some(base) if spec_url.starts_with('/') => Ok(Some(format!(
            "{}{}",
            base.as_str().trim_end_matches('/'),
            spec_url
        ))),
        Some(_) => Err(Error::template(format!(
            "Invalid server URL format in OpenAPI spec: '{}'",
            spec_url
        ))),
        None => {
            log::debug!(
                "Relative server URL '{}' and no base URL configured",
                spec_url
            );
            Ok(None)
        }
    }
}

//! Code generation entry point

use std::path::PathBuf;

use crate::{
    config::Config,
    error::Result,
    generator::Generator,
    openapi::OpenApiContext,
    properties::GenerationProperties,
    templates::{GenerationReport, TemplateManager},
};

/// Run one generator invocation described by `config`
pub async fn generate(config: &Config) -> Result<GenerationReport> {
    // 1. Resolve the generator and its templates before touching the schema
    let kind = config.generator_kind()?;
    let template_dir = config.template_dir.as_ref().map(PathBuf::from);
    let template_manager = TemplateManager::new(kind, template_dir).await?;

    // 2. Load OpenAPI schema
    let spec = OpenApiContext::from_file_or_url(&config.openapi_schema_path).await?;

    // 3. Decode properties, build and post-process the operation sets
    let generator = Generator::new(kind, config.segment_policy());
    let properties = GenerationProperties::from_map(config.property_map());
    let run = generator.run(properties, |_| spec.parse_operation_sets())?;
    log::debug!(
        "{} run over {} operation set(s)",
        kind,
        run.operation_sets.len()
    );

    // 4. Render
    template_manager.generate(&spec, config, run).await
}

//! relaygen CLI entrypoint
//! Parses command-line arguments and dispatches to the core generator.

// Internal imports (std, crate)
use std::path::PathBuf;

// External imports (alphabetized)
use anyhow::{bail, Context};
use clap::Parser;
use relaygen_core::{
    encode_mapping, encode_targets, parse_additional_properties, Config, GeneratorKind, TargetRef,
    TargetSummary,
};
use tokio::fs;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "relaygen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run the adapter or target generator against an OpenAPI description
    Generate {
        /// Generator to run: adapter or target
        #[arg(short, long)]
        generator: Option<String>,
        /// Path or URL to OpenAPI schema (YAML or JSON)
        #[arg(long)]
        schema_path: Option<String>,
        /// Output directory for generated code
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Project name made available to templates
        #[arg(long)]
        project_name: Option<String>,
        /// Template root, or the generator's own template directory
        #[arg(long)]
        template_dir: Option<PathBuf>,
        /// Additional generator properties as `key=value,key=value`
        ///
        /// Example: -p operationId=getPetById,targets=eyJ...
        #[arg(short = 'p', long = "additional-properties")]
        additional_properties: Vec<String>,
        /// YAML config file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
        /// Fail on the first undecodable `targets` segment instead of skipping it
        #[arg(long)]
        strict_targets: bool,
        /// Base URL for descriptions with a relative server URL
        #[arg(long)]
        base_url: Option<Url>,
    },
    /// Build the `targets` property from target runs' parsed-target.txt files
    PackTargets {
        /// `<api>_<operation>_<response>=<path to parsed-target.txt>`
        #[arg(long = "target", required = true)]
        targets: Vec<String>,
    },
    /// Print the base64 transport form of a mapping file
    Encode {
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            generator,
            schema_path,
            output_dir,
            project_name,
            template_dir,
            additional_properties,
            config,
            strict_targets,
            base_url,
        } => {
            let mut config = match config {
                Some(path) => Config::from_file(&path)
                    .await
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => {
                    let (Some(schema_path), Some(output_dir)) = (&schema_path, &output_dir) else {
                        bail!("--schema-path and --output-dir are required without --config");
                    };
                    Config::new("relaygen", schema_path, output_dir.to_string_lossy())
                }
            };

            if let Some(generator) = generator {
                config.generator = generator;
            }
            if let Some(schema_path) = schema_path {
                config.openapi_schema_path = schema_path;
            }
            if let Some(output_dir) = output_dir {
                config.output_dir = output_dir.to_string_lossy().into_owned();
            }
            if let Some(project_name) = project_name {
                config.project_name = project_name;
            }
            if let Some(template_dir) = template_dir {
                config.template_dir = Some(template_dir.to_string_lossy().into_owned());
            }
            if base_url.is_some() {
                config.base_url = base_url;
            }
            config.strict_targets |= strict_targets;

            for raw in &additional_properties {
                let properties = parse_additional_properties(raw)
                    .with_context(|| format!("Invalid additional properties '{}'", raw))?;
                for (key, value) in properties {
                    let value = value
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| value.to_string());
                    config.properties.insert(key, value);
                }
            }

            let kind: GeneratorKind = config.generator_kind()?;
            tracing::info!(
                generator = %kind,
                schema = %config.openapi_schema_path,
                output = %config.output_dir,
                "Generating"
            );

            let report = relaygen_core::generate(&config)
                .await
                .context("Generation failed")?;

            for diagnostic in &report.diagnostics {
                tracing::warn!("{}", diagnostic);
            }
            if kind == GeneratorKind::Target && report.resolved.is_none() {
                tracing::warn!("Target operation was not found; parsed-target.txt is empty");
            }
            println!(
                "Generated {} file(s) in {}",
                report.files.len(),
                config.output_dir
            );
        }
        Commands::PackTargets { targets } => {
            let mut descriptors = Vec::with_capacity(targets.len());
            for entry in &targets {
                let Some((id, path)) = entry.split_once('=') else {
                    bail!("Invalid --target '{}', expected <id>=<path>", entry);
                };
                let target = TargetRef::parse(id)?;
                let summary = TargetSummary::read_from(path)
                    .await
                    .with_context(|| format!("Failed to read target summary for {}", id))?;
                tracing::debug!(target_id = %target, api = %summary.api_name, "Packed target");
                descriptors.push(summary.to_descriptor(&target));
            }
            println!("{}", encode_targets(&descriptors));
        }
        Commands::Encode { file } => {
            let text = fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            println!("{}", encode_mapping(&text));
        }
    }
    Ok(())
}

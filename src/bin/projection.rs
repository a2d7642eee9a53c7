//! Schema Projection CLI
//!
//! Loads a model document, applies a list of projection transforms, and
//! prints the JSON schema pointer assigned to every shape.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use shape_projection::graph::{self, Severity};
use shape_projection::jsonschema::{create_default_strategy, DefaultPropertyNaming};
use shape_projection::{JsonSchemaConfig, TransformConfig, TransformRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-projection")]
#[command(about = "Project a shape model and assign JSON schema pointers")]
struct Cli {
    /// Path to the JSON model document
    #[arg(short, long)]
    model: PathBuf,

    /// Path to a jsonschema.toml config file
    #[arg(short, long)]
    config: Option<String>,

    /// Path to a JSON list of transforms: [{"name": ..., "args": {...}}]
    #[arg(short, long)]
    transforms: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = JsonSchemaConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    let model = graph::load_from_path(&cli.model)
        .with_context(|| format!("loading model {}", cli.model.display()))?;

    let transforms: Vec<TransformConfig> = match &cli.transforms {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading transforms {}", path.display()))?;
            serde_json::from_str(&content).with_context(|| format!("parsing transforms {}", path.display()))?
        }
        None => Vec::new(),
    };

    let registry = TransformRegistry::default();
    let model = registry.apply_all(model, &transforms)?;

    let strategy = create_default_strategy(&model, config, DefaultPropertyNaming)?;

    match cli.format {
        OutputFormat::Text => {
            for (id, pointer) in strategy.pointers() {
                println!("{} -> {}", id, pointer);
            }
            for event in strategy.diagnostics().at_least(Severity::Note) {
                eprintln!("{}", event);
            }
        }
        OutputFormat::Json => {
            let table: BTreeMap<String, &str> = strategy
                .pointers()
                .into_iter()
                .map(|(id, pointer)| (id.to_string(), pointer))
                .collect();
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
    }

    Ok(())
}

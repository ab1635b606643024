//! Prints the catalog of template tools known to a registry.
//!
//! Annotated functions in [`filters`] are registered on start-up; extra
//! sources (TOML files, directories, modules) can be layered on top.

mod filters;

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::Value;
use toolreg_core::{Arguments, ExampleGenerator, ToolKind, ToolRegistrar, ToolRegistry};
use toolreg_loaders::{ToolLoader, TomlLoaderConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "filter-catalog", about = "List registered template tools")]
struct Args {
    /// Extra sources to load: TOML files, directories, or module paths.
    #[arg(short, long = "source")]
    sources: Vec<String>,

    /// Table holding tool definitions inside TOML documents.
    #[arg(long)]
    key_path: Option<String>,

    /// Only list tools of this kind.
    #[arg(short, long)]
    kind: Option<ToolKind>,

    /// Print definitions as a JSON object instead of a listing.
    #[arg(long)]
    json: bool,

    /// Append a generated usage example to each tool.
    #[arg(short, long)]
    generate: bool,

    /// Call a tool with the JSON-encoded positional arguments that follow.
    #[arg(long, value_name = "NAME")]
    call: Option<String>,

    /// Positional arguments for `--call`, each a JSON value.
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let registrar = ToolRegistrar::default();
    for err in registrar.register_pending() {
        warn!(error = %err, "skipping annotated tool");
    }

    if !args.sources.is_empty() {
        let mut loader = ToolLoader::new(registrar.clone()).with_toml_config(TomlLoaderConfig {
            key_path: args.key_path.clone(),
            ..TomlLoaderConfig::default()
        });
        let report = loader.load_many(&args.sources);
        info!(
            registered = report.registered().len(),
            skipped = report.skipped().len(),
            "loaded extra sources"
        );
        for skipped in report.skipped() {
            eprintln!("skipped {}: {}", skipped.name, skipped.error);
        }
    }

    let registry = registrar.registry();
    if let Some(name) = &args.call {
        return call(registry, name, &args.args);
    }
    if args.json {
        return print_json(registry, args.kind);
    }
    print_listing(registry, args.kind, args.generate);
    Ok(())
}

fn call(registry: &ToolRegistry, name: &str, raw: &[String]) -> Result<()> {
    let Some(tool) = registry.lookup(name) else {
        bail!("no tool named `{name}`");
    };
    let values = raw
        .iter()
        .map(|text| serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone())))
        .collect::<Vec<_>>();
    let output = tool
        .call(&Arguments::positional(values))
        .with_context(|| format!("calling `{name}`"))?;
    println!("{output}");
    Ok(())
}

fn print_json(registry: &ToolRegistry, kind: Option<ToolKind>) -> Result<()> {
    let records: BTreeMap<_, _> = registry
        .get_all(kind)
        .into_iter()
        .filter(|(key, entry)| key == entry.metadata().name())
        .map(|(key, entry)| (key, entry.metadata().to_record()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn print_listing(registry: &ToolRegistry, kind: Option<ToolKind>, generate: bool) {
    let generator = ExampleGenerator::default();
    for (key, entry) in registry.get_all(kind) {
        let metadata = entry.metadata();
        if key != metadata.name() {
            continue;
        }
        println!(
            "{:<12} {:<8} [{}] {}",
            metadata.name(),
            metadata.kind(),
            metadata.group(),
            metadata.description().unwrap_or("")
        );
        if !metadata.aliases().is_empty() {
            let aliases: Vec<_> = metadata.aliases().iter().map(|alias| alias.as_str()).collect();
            println!("    aliases: {}", aliases.join(", "));
        }
        for example in metadata.examples() {
            println!("    {}: {}", example.title(), example.template());
        }
        if generate {
            match generator.generate(&entry) {
                Ok(text) => println!("    generated: {text}"),
                Err(err) => warn!(tool = metadata.name(), error = %err, "no generated example"),
            }
        }
    }
}

//! Schema Bindgen CLI
//!
//! Usage:
//!   schema-bindgen generate --schema voc.xsd --lang python --lang rust --out generated/
//!   schema-bindgen check --schema schemas/ --lang python --out generated/
//!   schema-bindgen graph --schema schemas/ --output types.dot
//!   schema-bindgen inspect --schema schemas/ --type ActStatusNormal

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use schema_bindgen::graph::TypeGraph;
use schema_bindgen::{
    BindgenConfig, FsSchemaSource, GenerateOptions, Generator, Language, MemorySink, StagedDirSink,
};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "schema-bindgen")]
#[command(about = "Generate native type bindings from XML Schema vocabularies")]
#[command(version)]
struct Cli {
    /// Configuration file (layered over bindgen.toml and BINDGEN__* variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SchemaArgs {
    /// Schema files or directories (directories are searched recursively)
    #[arg(short, long = "schema", required = true)]
    schema: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate bindings and write them to the output directory
    Generate {
        #[command(flatten)]
        schemas: SchemaArgs,

        /// Target languages (defaults to the configured list)
        #[arg(short, long = "lang", value_enum)]
        lang: Vec<Language>,

        /// Output directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Module file stem
        #[arg(long)]
        module: Option<String>,

        /// Render without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Fail on warnings
        #[arg(long)]
        warnings_as_errors: bool,
    },

    /// Report generated files that differ from a fresh generation
    Check {
        #[command(flatten)]
        schemas: SchemaArgs,

        #[arg(short, long = "lang", value_enum)]
        lang: Vec<Language>,

        #[arg(short, long)]
        out: Option<PathBuf>,

        #[arg(long)]
        module: Option<String>,
    },

    /// Export the type hierarchy as GraphViz DOT
    Graph {
        #[command(flatten)]
        schemas: SchemaArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the resolved model as JSON
    Inspect {
        #[command(flatten)]
        schemas: SchemaArgs,

        /// Only this type (local or `{namespace}local` name)
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the command succeeded
fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = BindgenConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Generate {
            schemas,
            lang,
            out,
            module,
            dry_run,
            warnings_as_errors,
        } => {
            apply_overrides(&mut config, lang, out, module);
            config.diagnostics.warnings_as_errors |= warnings_as_errors;
            let roots = collect_roots(&config, &schemas.schema)?;
            let generator = Generator::new(FsSchemaSource::new(), GenerateOptions::from(&config));

            let report = if dry_run {
                let mut sink = MemorySink::new();
                let report = generator.generate(&roots, &mut sink)?;
                for (path, content) in sink.files() {
                    println!("{} ({} bytes)", path.display(), content.len());
                }
                report
            } else {
                let mut sink = StagedDirSink::new(&config.output.dir)
                    .with_context(|| format!("creating {}", config.output.dir.display()))?;
                let report = generator.generate(&roots, &mut sink)?;
                for path in &report.written {
                    println!("✅ {}", config.output.dir.join(path).display());
                }
                report
            };

            if !report.diagnostics.is_empty() {
                eprint!("{}", report.diagnostics.format_all());
            }
            Ok(report.is_success())
        }

        Command::Check {
            schemas,
            lang,
            out,
            module,
        } => {
            apply_overrides(&mut config, lang, out, module);
            let roots = collect_roots(&config, &schemas.schema)?;
            let generator = Generator::new(FsSchemaSource::new(), GenerateOptions::from(&config));
            let report = generator.check(&roots, &config.output.dir)?;

            for drift in &report.drifted {
                if drift.missing {
                    println!("❌ {} is missing", drift.path.display());
                } else {
                    println!("❌ {} is out of date", drift.path.display());
                }
                print!("{}", drift.diff);
            }
            if !report.diagnostics.is_empty() {
                eprint!("{}", report.diagnostics.format_all());
            }
            if report.is_clean() {
                println!("✅ {} file(s) up to date", report.checked);
            }
            Ok(report.is_clean())
        }

        Command::Graph { schemas, output } => {
            let roots = collect_roots(&config, &schemas.schema)?;
            let generator = Generator::new(FsSchemaSource::new(), GenerateOptions::from(&config));
            let analysis = generator.analyze(&roots)?;
            let graph = TypeGraph::build(&analysis.model);
            let dot = graph.to_dot();

            match output {
                Some(path) => {
                    std::fs::write(&path, &dot).with_context(|| format!("writing {}", path.display()))?;
                    eprintln!(
                        "✅ Exported {} types, {} edges to {}",
                        graph.node_count(),
                        graph.edge_count(),
                        path.display()
                    );
                }
                None => print!("{}", dot),
            }
            if !analysis.diagnostics.is_empty() {
                eprint!("{}", analysis.diagnostics.format_all());
            }
            Ok(!analysis.diagnostics.has_errors())
        }

        Command::Inspect { schemas, type_name } => {
            let roots = collect_roots(&config, &schemas.schema)?;
            let generator = Generator::new(FsSchemaSource::new(), GenerateOptions::from(&config));
            let analysis = generator.analyze(&roots)?;

            let json = match type_name {
                Some(name) => match analysis.resolved.find(&name) {
                    Some(ty) => serde_json::to_string_pretty(&ty)?,
                    None if analysis.model.find_local(&name).is_empty() => bail!("no type named '{}'", name),
                    None => bail!("type '{}' is not an enumeration or complex type, or failed to resolve", name),
                },
                None => {
                    let types: Vec<_> = analysis.resolved.types().collect();
                    serde_json::to_string_pretty(&serde_json::json!({
                        "types": types,
                        "failed": analysis.resolved.failed(),
                    }))?
                }
            };
            println!("{}", json);
            if !analysis.diagnostics.is_empty() {
                eprint!("{}", analysis.diagnostics.format_all());
            }
            Ok(!analysis.diagnostics.has_errors())
        }
    }
}

fn apply_overrides(config: &mut BindgenConfig, lang: Vec<Language>, out: Option<PathBuf>, module: Option<String>) {
    if !lang.is_empty() {
        config.output.languages = lang;
    }
    if let Some(out) = out {
        config.output.dir = out;
    }
    if let Some(module) = module {
        config.output.module_name = module;
    }
}

/// Expand directories into their schema files, sorted for reproducible runs
fn collect_roots(config: &BindgenConfig, paths: &[PathBuf]) -> anyhow::Result<Vec<String>> {
    let mut roots = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && config.is_schema_file(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            if found.is_empty() {
                bail!("no schema files found under {}", path.display());
            }
            roots.extend(found.iter().map(|p| path_string(p)));
        } else {
            roots.push(path_string(path));
        }
    }
    Ok(roots)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

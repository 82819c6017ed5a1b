//! DTO Validator CLI
//!
//! Resolves schema documents and validates JSON data against them.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dto_schema::config::OutputFormat;
use dto_schema::{EngineConfig, SchemaDocument};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dto-validate")]
#[command(about = "Validate JSON data against DTO schema documents")]
struct Cli {
    /// Path to a config file (defaults to dto-schema.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a schema document and report dangling names
    Check {
        /// Schema document (.json or .toml)
        schema: PathBuf,
    },

    /// Validate data against a named type
    Validate {
        /// Schema document (.json or .toml)
        schema: PathBuf,
        /// Name of the type to validate against
        #[arg(short = 't', long = "type")]
        type_name: String,
        /// JSON data file (reads stdin if omitted)
        data: Option<PathBuf>,
        /// Only check the shape, ignoring checks and invariants
        #[arg(long)]
        structure: bool,
        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// List the types and checks a schema document defines
    List {
        /// Schema document (.json or .toml)
        schema: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// Returns whether the command succeeded
fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = EngineConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Check { schema } => {
            let document = SchemaDocument::load(&schema)
                .with_context(|| format!("reading {}", schema.display()))?;
            match document.build_schema(&config) {
                Ok(resolved) => {
                    println!("✅ {} - {} types resolved", schema.display(), resolved.names().count());
                    Ok(true)
                }
                Err(e) => {
                    println!("❌ {} - {}", schema.display(), e);
                    for name in e.undefined_names() {
                        println!("   └─ undefined `{}`", name);
                    }
                    Ok(false)
                }
            }
        }

        Commands::Validate {
            schema,
            type_name,
            data,
            structure,
            compact,
        } => {
            let document = SchemaDocument::load(&schema)
                .with_context(|| format!("reading {}", schema.display()))?;
            let resolved = document.build_schema(&config)?;
            let handle = resolved.get(&type_name)?;

            let raw = match &data {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let value: serde_json::Value = serde_json::from_str(&raw).context("parsing data")?;

            if structure {
                let ok = handle.is_valid_structure(&value);
                println!("{}", if ok { "✅ structure matches" } else { "❌ structure does not match" });
                return Ok(ok);
            }

            let errors = handle.validate(&value);
            let format = if compact { OutputFormat::Compact } else { config.output.format };
            println!("{}", format.render(&errors)?);
            Ok(errors.is_empty())
        }

        Commands::List { schema } => {
            let document = SchemaDocument::load(&schema)
                .with_context(|| format!("reading {}", schema.display()))?;
            let resolved = match document.build_schema(&config) {
                Ok(resolved) => resolved,
                Err(e) => bail!("{} does not resolve: {}", schema.display(), e),
            };

            println!("Types:");
            for name in resolved.names() {
                println!("  {}", name);
            }
            println!("Checks:");
            for name in resolved.check_names() {
                println!("  {}", name);
            }
            Ok(true)
        }
    }
}

//! fgadoc binary
//!
//! Prints the canonical form of an OpenFGA authorization model.
//!
//! # Usage
//!
//! ```bash
//! # Canonical JSON of a DSL file
//! fgadoc --dsl model.fga
//!
//! # Modular model, rendered back as DSL
//! fgadoc --mod-file model/fga.mod --output dsl
//!
//! # Sources from a config file, overridden by the environment
//! FGADOC_DOCUMENT__OUTPUT=native fgadoc --config fgadoc.yaml
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use fgadoc_cli::observability::{init_logging, LoggingConfig};
use fgadoc_cli::{read_document_source, render, CliConfig, DocumentSettings, OutputFormat};
use fgadoc_domain::bounded::native_model_schema;
use fgadoc_domain::OpenFgaTransformer;

/// fgadoc - canonical OpenFGA authorization model documents
#[derive(Parser, Debug)]
#[command(name = "fgadoc")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model in DSL form
    #[arg(long)]
    dsl: Option<PathBuf>,

    /// Model in JSON form
    #[arg(long)]
    json: Option<PathBuf>,

    /// Native model object (JSON)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Module descriptor (fga.mod) of a modular model
    #[arg(long = "mod-file")]
    mod_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Print the attribute schema of the native model form and exit
    #[arg(long)]
    print_schema: bool,
}

impl Args {
    fn document_settings(&self) -> DocumentSettings {
        DocumentSettings {
            dsl: self.dsl.clone(),
            json: self.json.clone(),
            model: self.model.clone(),
            mod_file_path: self.mod_file.clone(),
            output: OutputFormat::default(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::from_env()?,
    };

    init_logging(LoggingConfig::from(&config.logging));

    if args.print_schema {
        println!("{}", serde_json::to_string_pretty(&native_model_schema())?);
        return Ok(());
    }

    let document = config
        .document
        .overridden_by(args.document_settings(), args.output);
    info!(version = env!("CARGO_PKG_VERSION"), output = ?document.output, "Starting fgadoc");

    let source = read_document_source(&document)?;
    let rendered = render(&source, document.output, &OpenFgaTransformer)
        .context("unable to render authorization model")?;
    println!("{rendered}");

    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use yamlwalk::config::Config;
use yamlwalk::document::emitter::emit_yaml;
use yamlwalk::file::{load_yaml_file, load_yaml_from_stdin, save_yaml_file};
use yamlwalk::transform::MergeKeyNormalizer;
use yamlwalk::visitor::{Scope, Visitor};

/// yamlwalk - Collapse repeated YAML merge keys
#[derive(Parser)]
#[command(name = "yamlwalk")]
#[command(version)]
#[command(about = "Rewrites YAML so every mapping has at most one merge key", long_about = None)]
struct Cli {
    /// YAML file to read (omit to read from stdin)
    file: Option<PathBuf>,

    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep merge sources in document order instead of reversing them
    #[arg(long)]
    retain_merge_key_order: bool,

    /// Accept input whose top-level nodes are not documents
    #[arg(long)]
    skip_document_check: bool,

    /// Configuration file (default: ~/.config/yamlwalk/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8, default_level: &str) {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => default_level,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    config.skip_document_check |= cli.skip_document_check;
    config.retain_merge_key_order |= cli.retain_merge_key_order;

    init_tracing(cli.verbose, &config.log_level);
    debug!(?config, "loaded configuration");

    let mut tree = match &cli.file {
        Some(path) => load_yaml_file(path)?,
        None => load_yaml_from_stdin()?,
    };

    let normalizer = MergeKeyNormalizer::new(config.merge_options());
    let mut visitor = Visitor::with_options(config.visitor_options(), normalizer)?;
    let scope = Scope::new();
    let documents = tree.documents().to_vec();
    for (index, document) in documents.into_iter().enumerate() {
        visitor
            .visit(&scope, &mut tree, document)
            .with_context(|| format!("Failed to normalize document {}", index + 1))?;
    }
    info!(documents = tree.documents().len(), "normalized merge keys");

    match &cli.output {
        Some(path) => save_yaml_file(path, &tree, &config)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(emit_yaml(&tree).as_bytes())
                .context("Failed to write to stdout")?;
            stdout.flush()?;
        }
    }

    Ok(())
}

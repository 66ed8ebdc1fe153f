use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lineagesync_core::{Severity, SyncConfig, SyncReport};
use lineagesync_manifest::Manifest;
use lineagesync_marquez::{
    fetch_lineage, simplify_str, DatasetId, DryRunSink, LineageSink, MarquezClient, SyncRunner,
};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "lineagesync.toml";

/// lineagesync - Column-level dbt lineage for Marquez
#[derive(Parser)]
#[command(name = "lineagesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: lineagesync.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build lineage events for models and send them to Marquez
    Sync {
        /// Sync only the model with this name
        #[arg(short, long)]
        model: Option<String>,

        /// Path to the lineage manifest (overrides config)
        #[arg(short = 'f', long)]
        manifest: Option<PathBuf>,

        /// Marquez base URL (overrides config)
        #[arg(long)]
        marquez_url: Option<String>,

        /// Print events instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Also write the sync report as JSON
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Delete a dataset from Marquez
    DeleteDataset {
        /// Dataset name
        name: String,

        /// Namespace holding the dataset
        #[arg(short, long)]
        namespace: String,

        /// Marquez base URL (overrides config)
        #[arg(long)]
        marquez_url: Option<String>,
    },

    /// Reduce a Marquez lineage API response to datasets, jobs and edges
    Simplify {
        /// File or http(s) URL to read; stdin when omitted
        input: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    let mut config = load_config(cli.config.as_deref())?;
    init_logging(&config, cli.verbose);

    match cli.command {
        Commands::Sync {
            model,
            manifest,
            marquez_url,
            dry_run,
            report,
        } => {
            if let Some(manifest) = manifest {
                config.paths.manifest = manifest;
            }
            if let Some(url) = marquez_url {
                config.marquez.url = url;
            }
            sync_command(&config, model.as_deref(), dry_run, report.as_deref()).await
        }
        Commands::DeleteDataset {
            name,
            namespace,
            marquez_url,
        } => {
            if let Some(url) = marquez_url {
                config.marquez.url = url;
            }
            delete_dataset_command(&config, &namespace, &name).await
        }
        Commands::Simplify { input } => simplify_command(input.as_deref()).await,
    }
}

/// Load the explicit config file, or `lineagesync.toml` if present, or defaults
fn load_config(path: Option<&Path>) -> Result<SyncConfig> {
    let config = match path {
        Some(path) => SyncConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => SyncConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE))
            .context("Failed to load lineagesync.toml")?,
    };
    Ok(config)
}

/// `RUST_LOG` wins, then `--verbose`, then `logging.level`
fn init_logging(config: &SyncConfig, verbose: bool) {
    let fallback = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Sync command - emit one lineage event per model
async fn sync_command(
    config: &SyncConfig,
    model: Option<&str>,
    dry_run: bool,
    report_path: Option<&Path>,
) -> Result<()> {
    let manifest_path = &config.paths.manifest;
    let manifest = Manifest::from_file(manifest_path)
        .with_context(|| format!("Failed to load manifest {}", manifest_path.display()))?;

    tracing::info!("Loaded manifest with {} nodes", manifest.nodes.len());

    let sink: Box<dyn LineageSink> = if dry_run {
        Box::new(DryRunSink::stdout())
    } else {
        tracing::debug!("Sending events to {}", config.marquez.base_url());
        Box::new(MarquezClient::from_config(config))
    };

    let report = SyncRunner::new(&manifest, config.openlineage.clone(), sink.as_ref())
        .run(model)
        .await;

    if let Some(path) = report_path {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        eprintln!("{} {}", "Report saved to:".green(), path.display());
    }

    print_sync_summary(&report);

    if report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Delete dataset command
async fn delete_dataset_command(config: &SyncConfig, namespace: &str, name: &str) -> Result<()> {
    let client = MarquezClient::from_config(config);
    let dataset = DatasetId::new(namespace, name);

    client
        .delete_dataset(&dataset)
        .await
        .with_context(|| format!("Failed to delete dataset {}", dataset))?;

    eprintln!("{} {}", "✓ Dataset deleted:".green().bold(), dataset);
    Ok(())
}

/// Simplify command - read a lineage graph and print the reduced JSON
async fn simplify_command(input: Option<&str>) -> Result<()> {
    let raw = match input {
        Some(url) if url.starts_with("http") => {
            eprintln!("Fetching data: {}", url);
            fetch_lineage(url).await?
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            raw
        }
    };

    let (simplified, stats) = simplify_str(&raw)?;

    eprintln!("{}", stats);
    println!("{}", serde_json::to_string_pretty(&simplified)?);
    Ok(())
}

/// Print sync summary to stderr, keeping stdout free for dry-run events
fn print_sync_summary(report: &SyncReport) {
    let summary = &report.summary;

    eprintln!("\n{}", "=".repeat(60).bright_blue());
    eprintln!("{}", "Lineage Sync Report".bold().bright_blue());
    eprintln!("{}", "=".repeat(60).bright_blue());
    eprintln!();

    let completed = format!(
        "Sync completed: {}/{} successful",
        summary.models_synced, summary.models_total
    );
    if summary.models_failed > 0 {
        eprintln!("{}", completed.red().bold());
    } else {
        eprintln!("{}", completed.green().bold());
    }

    if summary.warnings > 0 {
        eprintln!("  Unresolved columns: {}", format!("{}", summary.warnings).yellow());
    } else {
        eprintln!("  Unresolved columns: {}", format!("{}", summary.warnings).green());
    }

    if summary.models_failed > 0 {
        eprintln!("  Failed models:      {}", format!("{}", summary.models_failed).red().bold());
    }

    if !report.diagnostics.is_empty() {
        eprintln!();
        eprintln!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };

            eprintln!("  [{}] {}: {}", severity_str, diag.code, diag.message);
            if let Some(node) = &diag.node_id {
                eprintln!("    at {}", node);
            }
        }
    }

    eprintln!();
    eprintln!("{}", "=".repeat(60).bright_blue());
}

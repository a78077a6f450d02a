//! CLI command definitions for curaforge.
//!
//! This module provides the command-line interface for curating a batch of
//! generated images in one shot and inspecting the effective configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crate::metrics::{export_metrics, init_metrics};
use crate::pipeline::{CurationEngine, FilterConfig, StrategyKind};

use super::manifest::load_manifest;

/// Quality filtering and diversity curation for generated image datasets.
#[derive(Parser)]
#[command(name = "curaforge")]
#[command(about = "Curate generated image datasets by quality and diversity")]
#[command(version)]
#[command(
    long_about = "curaforge scores generated images on pixel and learned quality metrics, filters them under a configurable strategy, and thins out near-duplicates.\n\nExample usage:\n  curaforge curate --manifest batch.json --config curate.yaml --output outcome.json"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Assess, filter and diversify a batch manifest.
    Curate(CurateArgs),

    /// Print the effective configuration as YAML.
    Config(ConfigArgs),
}

/// Arguments for `curaforge curate`.
#[derive(Parser, Debug)]
pub struct CurateArgs {
    /// JSON manifest of images to curate.
    #[arg(short, long)]
    pub manifest: PathBuf,

    /// Configuration file (YAML, or JSON with a .json extension).
    #[arg(short, long, env = "CURATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Filtering strategy, overriding the configuration.
    #[arg(short, long)]
    pub strategy: Option<StrategyKind>,

    /// Write the outcome JSON here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print Prometheus metrics to stderr after the run.
    #[arg(long)]
    pub metrics: bool,
}

/// Arguments for `curaforge config`.
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration file (YAML, or JSON with a .json extension).
    #[arg(short, long, env = "CURATE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Curate(args) => run_curate_command(args).await,
        Commands::Config(args) => run_config_command(args),
    }
}

/// Loads the file (if any), then overlays `CURATE_*` variables.
fn load_config(path: Option<&Path>) -> anyhow::Result<FilterConfig> {
    let config = match path {
        Some(path) => FilterConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FilterConfig::default(),
    };
    config
        .with_env_overrides()
        .context("Invalid CURATE_* environment override")
}

async fn run_curate_command(args: CurateArgs) -> anyhow::Result<()> {
    if args.metrics {
        init_metrics().context("Failed to initialize metrics registry")?;
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(strategy) = args.strategy {
        config = config.with_strategy(strategy);
    }

    let images = load_manifest(&args.manifest)?;
    info!(
        manifest = %args.manifest.display(),
        images = images.len(),
        strategy = %config.strategy,
        "Loaded batch manifest"
    );

    let engine = CurationEngine::new(config).context("Invalid curation configuration")?;
    let outcome = engine.curate(&images).await;

    info!("{}", outcome.filter_report.summary());
    if let Some(report) = &outcome.diversity_report {
        info!("{}", report.summary());
    }

    let json_output = serde_json::to_string_pretty(&outcome)
        .context("Failed to serialize curation outcome")?;
    match &args.output {
        Some(path) => {
            fs::write(path, json_output)
                .with_context(|| format!("Failed to write outcome to {}", path.display()))?;
            info!(output = %path.display(), "Wrote curation outcome");
        }
        None => println!("{}", json_output),
    }

    if args.metrics {
        eprint!("{}", export_metrics());
    }
    Ok(())
}

fn run_config_command(args: ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ManifestEntry;
    use crate::candidate::CandidateImage;
    use clap::CommandFactory;
    use ndarray::Array3;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_curate_command_defaults() {
        let cli = Cli::try_parse_from(["curaforge", "curate", "--manifest", "batch.json"])
            .expect("should parse");

        assert_eq!(cli.log_level, "info");
        match cli.command {
            Commands::Curate(args) => {
                assert_eq!(args.manifest, PathBuf::from("batch.json"));
                assert!(args.strategy.is_none());
                assert!(args.output.is_none());
                assert!(!args.metrics);
            }
            _ => panic!("Expected Curate command"),
        }
    }

    #[test]
    fn test_curate_command_with_all_options() {
        let cli = Cli::try_parse_from([
            "curaforge",
            "curate",
            "-m",
            "batch.json",
            "-c",
            "curate.yaml",
            "-s",
            "threshold",
            "-o",
            "out.json",
            "--metrics",
            "-l",
            "debug",
        ])
        .expect("should parse");

        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Curate(args) => {
                assert_eq!(args.config, Some(PathBuf::from("curate.yaml")));
                assert_eq!(args.strategy, Some(StrategyKind::Threshold));
                assert_eq!(args.output, Some(PathBuf::from("out.json")));
                assert!(args.metrics);
            }
            _ => panic!("Expected Curate command"),
        }
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let result =
            Cli::try_parse_from(["curaforge", "curate", "--manifest", "b.json", "-s", "vote"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_command() {
        let cli = Cli::try_parse_from(["curaforge", "config"]).expect("should parse");
        assert!(matches!(cli.command, Commands::Config(_)));
    }

    #[tokio::test]
    async fn test_curate_writes_outcome() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = dir.path().join("batch.json");
        let config = dir.path().join("curate.yaml");
        let output = dir.path().join("outcome.json");

        let entries: Vec<ManifestEntry> = [("mid", 128u8), ("light", 250u8)]
            .iter()
            .map(|(id, v)| {
                ManifestEntry::from_image(&CandidateImage::with_id(
                    *id,
                    Array3::from_elem((16, 16, 3), *v),
                ))
            })
            .collect();
        fs::write(&manifest, serde_json::to_string(&entries).expect("json")).expect("write");
        fs::write(
            &config,
            "enabled_metrics: [brightness]\nenable_diversity: false\n",
        )
        .expect("write");

        run_curate_command(CurateArgs {
            manifest,
            config: Some(config),
            strategy: Some(StrategyKind::Threshold),
            output: Some(output.clone()),
            metrics: false,
        })
        .await
        .expect("curate");

        let outcome: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output).expect("read")).expect("json");
        assert_eq!(outcome["retained"].as_array().map(Vec::len), Some(1));
        assert_eq!(outcome["retained"][0]["id"], "mid");
        assert_eq!(outcome["filter_report"]["rejected_count"], 1);
    }

    #[tokio::test]
    async fn test_missing_manifest_is_an_error() {
        let result = run_curate_command(CurateArgs {
            manifest: PathBuf::from("/nonexistent/batch.json"),
            config: None,
            strategy: None,
            output: None,
            metrics: false,
        })
        .await;
        assert!(result.is_err());
    }
}

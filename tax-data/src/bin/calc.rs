use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::de::DeserializeOwned;
use tax_core::{CalculationRequest, CombinedRequest, RuleSetRepository, TaxEngine};
use tax_data::DirectorySource;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Multi-jurisdiction tax calculator.
///
/// Loads the rule sets in a data directory, reads one calculation request
/// as JSON and prints the result as JSON on stdout.
#[derive(Debug, Parser)]
#[command(name = "tax-calc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding `*.toml` rule-set manifests and `brackets.csv`.
    #[arg(long, default_value = "tax-data/test-data")]
    data: PathBuf,

    /// Request file in JSON. `-` reads from stdin.
    #[arg(long, default_value = "-")]
    request: String,

    /// Read a combined income tax and social security request.
    #[arg(long, default_value_t = false)]
    combined: bool,

    /// List the loaded jurisdictions and their versions instead of calculating.
    #[arg(long, default_value_t = false)]
    list: bool,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set, otherwise uses `level`.
/// * Writes to stderr so stdout carries only JSON.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

// ─── commands ────────────────────────────────────────────────────────────────

fn read_request<T: DeserializeOwned>(path: &str) -> Result<T> {
    let text = if path == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read request from stdin")?;
        text
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read request: {path}"))?
    };

    serde_json::from_str(&text).with_context(|| format!("Invalid request: {path}"))
}

fn list(repository: &RuleSetRepository) {
    for code in repository.jurisdictions() {
        for version in repository.versions(&code) {
            let until = version
                .effective_to
                .map(|to| to.to_string())
                .unwrap_or_else(|| "open".to_string());
            let supported: Vec<&str> = version
                .supported_calculations()
                .iter()
                .map(|t| t.as_str())
                .collect();
            println!(
                "{code}  {} .. {until}  {}",
                version.effective_from,
                supported.join(", ")
            );
        }
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let repository = Arc::new(RuleSetRepository::new());
    let source = DirectorySource::new(&cli.data);
    let loaded = repository
        .reload_from(&source)
        .with_context(|| format!("Failed to load rule sets from: {}", cli.data.display()))?;
    info!(rule_sets = loaded, "rule sets loaded");

    if cli.list {
        list(&repository);
        return Ok(());
    }

    let engine = TaxEngine::new(repository);
    let output = if cli.combined {
        let request: CombinedRequest = read_request(&cli.request)?;
        debug!(jurisdiction = %request.jurisdiction_code, "read combined request");
        let result = engine
            .calculate_combined(&request)
            .context("Combined calculation failed")?;
        serde_json::to_string_pretty(&result)
    } else {
        let request: CalculationRequest = read_request(&cli.request)?;
        debug!(
            jurisdiction = %request.jurisdiction_code,
            calculation_type = %request.calculation_type(),
            "read request"
        );
        let result = engine.calculate(&request).context("Calculation failed")?;
        serde_json::to_string_pretty(&result)
    };

    println!("{}", output.context("Failed to encode result")?);
    Ok(())
}

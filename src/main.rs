//! plant-health - offline sensor log analysis
//!
//! Loads a press or furnace CSV export, runs repair, anomaly aggregation,
//! performance scoring and the maintenance advisor, then writes the report.
//!
//! # Usage
//!
//! ```bash
//! # Analyse a press export, JSON and text reports into ./reports
//! plant-health --domain press --csv data/press.csv
//!
//! # Furnace with an explicit config, text only
//! plant-health --domain furnace --csv data/furnace.csv --config plant_health.toml --format text
//!
//! # Synthetic data round trip
//! simulation --domain furnace --rows 2000 --out furnace.csv && plant-health --domain furnace --csv furnace.csv
//! ```
//!
//! # Environment Variables
//!
//! - `PLANT_HEALTH_CONFIG`: config file used when `--config` is not given
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};

use plant_health::report::{self, ReportFormat};
use plant_health::{AnalysisConfig, Domain};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Text,
    Both,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => ReportFormat::Json,
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Both => ReportFormat::Both,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "plant-health")]
#[command(about = "Anomaly detection and performance scoring for press and furnace sensor logs")]
#[command(version)]
struct CliArgs {
    /// Machine family of the export (press or furnace)
    #[arg(short, long)]
    domain: Domain,

    /// CSV export to analyse
    #[arg(long, value_name = "PATH")]
    csv: PathBuf,

    /// TOML config (falls back to PLANT_HEALTH_CONFIG, ./plant_health.toml, defaults)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Report output directory
    #[arg(short, long, default_value = "reports")]
    out: PathBuf,

    /// Report formats to write
    #[arg(short, long, value_enum, default_value = "both")]
    format: FormatArg,

    /// Also print the text report to stdout
    #[arg(long)]
    print: bool,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::load(),
    };
    info!(plant = %config.site.plant, domain = %args.domain, "Starting analysis");

    let (dataset, ingest) = plant_health::load_csv(&args.csv)
        .with_context(|| format!("reading {}", args.csv.display()))?;
    if ingest.header_rows_dropped > 0 {
        warn!(rows = ingest.header_rows_dropped, "Repeated header rows dropped");
    }

    let analysis = plant_health::analyze(args.domain, &dataset, &config)
        .with_context(|| format!("{} analysis of {}", args.domain, args.csv.display()))?;

    let written = report::write_reports(&analysis, &args.out, args.format.into())
        .with_context(|| format!("writing reports to {}", args.out.display()))?;

    if args.print {
        println!("{}", report::render_text(&analysis));
    }

    let (total, band) = analysis.total_score();
    info!(
        score = total,
        band = %band,
        recommendations = analysis.recommendations().len(),
        issues = analysis.issues().len(),
        reports = written.len(),
        "Done"
    );
    Ok(())
}

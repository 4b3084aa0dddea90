use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};

use catalog_stats::app::ports::ReportOutputPort;
use catalog_stats::app::{LookupUseCase, ReportUseCase};
use catalog_stats::config::{Config, NormalizeConfig};
use catalog_stats::infra::{
    ConsoleReportOutputAdapter, FileChartOutputAdapter, JsonReportOutputAdapter,
};
use catalog_stats::pipeline::{self, CatalogSnapshot};
use catalog_stats::presentation::{Menu, TerminalInput};
use catalog_stats::{logging, observability};

#[derive(Parser)]
#[command(name = "catalog_stats")]
#[command(about = "Streaming catalog statistics and title lookup")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a config.toml (defaults to $CATALOG_STATS_CONFIG or ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the catalog report and write the chart artifacts
    Report {
        /// Catalog CSV file
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory for chart artifacts
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Also write the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive title lookup
    Menu {
        /// Catalog CSV file
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Report, then the interactive lookup
    Run {
        /// Catalog CSV file
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory for chart artifacts
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn resolve_input(flag: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    flag.or_else(|| config.input.path.clone())
        .ok_or_else(|| anyhow!("No input CSV given: pass --input or set [input] path in the config"))
}

fn load_snapshot(path: &Path, normalize: &NormalizeConfig) -> Result<CatalogSnapshot> {
    let table = pipeline::load_path(path)
        .with_context(|| format!("Failed to load catalog from {}", path.display()))?;
    let snapshot = pipeline::normalize(&table, normalize).context("Failed to normalize catalog")?;
    info!("Loaded {} titles from {}", snapshot.len(), path.display());
    Ok(snapshot)
}

fn run_report(
    snapshot: &CatalogSnapshot,
    config: &Config,
    output_dir: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let report_config = config.report.clone();
    let output_dir = output_dir.unwrap_or_else(|| report_config.output_dir.clone());

    let mut outputs: Vec<Box<dyn ReportOutputPort>> = vec![
        Box::new(ConsoleReportOutputAdapter::stdout(
            report_config.chart_width,
            report_config.show_preview_rows,
        )),
        Box::new(FileChartOutputAdapter::new(&output_dir, &report_config)?),
    ];
    if json {
        outputs.push(Box::new(JsonReportOutputAdapter::new(&output_dir)?));
    }

    let mut use_case = ReportUseCase::new(report_config, outputs);
    let report = use_case.run(snapshot)?;

    if report.data_quality.total_dropped() > 0 {
        warn!(
            "{} rows were dropped by the quality gate",
            report.data_quality.total_dropped()
        );
    }
    for failure in &report.failed_aggregates {
        warn!("Aggregate {} was left empty: {}", failure.aggregate, failure.error);
        eprintln!("⚠️  {} skipped: {}", failure.aggregate, failure.error);
    }
    println!("✅ Charts written to {}", output_dir.display());
    Ok(())
}

fn run_menu(snapshot: &CatalogSnapshot) -> Result<()> {
    let lookup = LookupUseCase::new(snapshot)?;
    let menu = Menu::new(&lookup);

    let stdin = io::stdin();
    if stdin.is_terminal() {
        menu.run_with(TerminalInput::new()?, io::stdout())?;
    } else {
        menu.run(stdin.lock(), io::stdout())?;
    }
    Ok(())
}

fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Report {
            input,
            output_dir,
            json,
        } => {
            println!("📊 Building catalog report...");
            let path = resolve_input(input, config)?;
            let snapshot = load_snapshot(&path, &config.normalize)?;
            run_report(&snapshot, config, output_dir, json)
        }
        Commands::Menu { input } => {
            let path = resolve_input(input, config)?;
            let snapshot = load_snapshot(&path, &config.normalize)?;
            run_menu(&snapshot)
        }
        Commands::Run { input, output_dir } => {
            println!("🚀 Running report and lookup...");
            let path = resolve_input(input, config)?;
            let snapshot = load_snapshot(&path, &config.normalize)?;

            println!("\n📥 Step 1: Building report...");
            run_report(&snapshot, config, output_dir, false)?;

            println!("\n🔎 Step 2: Title lookup");
            run_menu(&snapshot)
        }
    }
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _guard = logging::init_logging(&config.logging);

    if let Err(e) = observability::init() {
        warn!("Metrics recorder not installed: {}", e);
    }

    let result = run(cli.command, &config);

    if let Some(snapshot) = observability::snapshot() {
        debug!("Metrics snapshot:\n{}", snapshot);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("catalog_stats failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

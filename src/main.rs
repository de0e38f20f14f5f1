//! CLI entry point for the bikeshare trip analyzer.
//!
//! Provides subcommands for a one-shot report, an interactive explorer, and
//! listing the configured cities.

mod prompt;

use crate::prompt::{Prompter, run_explorer};
use anyhow::Result;
use bikeshare_stats::config::{AnalyzerConfig, parse_year};
use bikeshare_stats::engine::{TripAnalysis, TripStatsEngine};
use bikeshare_stats::filter::{FilterSpec, apply};
use bikeshare_stats::output::{
    export_file_name, export_trips, log_summary, render_text, title_case, to_json, write_json,
};
use bikeshare_stats::stats::report::SummaryReport;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_stats")]
#[command(about = "Explore bikeshare trip logs by city, month, day and hour", long_about = None)]
struct Cli {
    /// Directory holding the per-city CSV files [env: BIKESHARE_DATA_DIR]
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON file replacing the built-in city catalog [env: BIKESHARE_CATALOG]
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Year rider ages are computed against [env: BIKESHARE_REFERENCE_YEAR]
    #[arg(long, global = true)]
    reference_year: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the summary report for one filter selection
    Analyze {
        /// City name as listed by `cities`
        #[arg(short, long)]
        city: String,

        /// Month name (January-June) or "all"
        #[arg(short, long, default_value = "all")]
        month: String,

        /// Day of week or "all"
        #[arg(short, long, default_value = "all")]
        day: String,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Export the filtered trips as CSV (timestamped name if no path is given)
        #[arg(long, num_args = 0..=1)]
        export_csv: Option<Option<PathBuf>>,

        /// Save the report as JSON (timestamped name if no path is given)
        #[arg(long, num_args = 0..=1)]
        export_json: Option<Option<PathBuf>>,
    },
    /// Choose filters interactively and view reports until done
    Explore,
    /// List configured cities and whether their data files are present
    Cities,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bikeshare_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = AnalyzerConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(path) = cli.catalog {
        config.catalog_path = Some(path);
    }
    if let Some(year) = cli.reference_year {
        config.reference_year = parse_year(&year)?;
    }
    let engine = TripStatsEngine::from_config(&config)?;

    match cli.command {
        Commands::Analyze {
            city,
            month,
            day,
            format,
            export_csv,
            export_json,
        } => {
            let spec = FilterSpec::new(&city, &month, &day)?;
            if export_csv.is_some() || export_json.is_some() {
                analyze_and_export(&engine, &spec, format, export_csv, export_json)?;
            } else {
                print_report(&engine, &spec, format)?;
            }
        }
        Commands::Explore => {
            let stdin = std::io::stdin();
            let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
            run_explorer(&engine, &mut prompter)?;
        }
        Commands::Cities => {
            list_cities(&engine);
        }
    }

    Ok(())
}

/// Prints one report to stdout in the requested format.
#[tracing::instrument(skip(analysis, format), fields(city = %spec.city()))]
fn print_report(analysis: &impl TripAnalysis, spec: &FilterSpec, format: Format) -> Result<()> {
    let report = analysis.submit_filter(spec)?;
    log_summary(&report);
    match format {
        Format::Text => print!("{}", render_text(&report)),
        Format::Json => println!("{}", to_json(&report)?),
    }
    Ok(())
}

/// Like [`print_report`], also writing the filtered trips and/or the report
/// to files.
fn analyze_and_export(
    engine: &TripStatsEngine,
    spec: &FilterSpec,
    format: Format,
    export_csv: Option<Option<PathBuf>>,
    export_json: Option<Option<PathBuf>>,
) -> Result<()> {
    let dataset = engine.load(spec.city())?;
    let view = apply(&dataset, spec);
    let report = SummaryReport::build(&view, spec, engine.reference_year());
    log_summary(&report);
    let now = Utc::now();

    match format {
        Format::Text => print!("{}", render_text(&report)),
        Format::Json => println!("{}", to_json(&report)?),
    }

    if let Some(path) = export_csv {
        let path = path
            .unwrap_or_else(|| PathBuf::from(export_file_name("bikeshare_filtered_data", "csv", now)));
        let rows = export_trips(&path, &view)?;
        eprintln!("Exported {} trips to {}", rows, path.display());
    }

    if let Some(path) = export_json {
        let path = path.unwrap_or_else(|| PathBuf::from(export_file_name("bikeshare_summary", "json", now)));
        write_json(&path, &report)?;
        eprintln!("Saved report to {}", path.display());
    }

    Ok(())
}

fn list_cities(engine: &TripStatsEngine) {
    let catalog = engine.catalog();
    let availability = catalog.availability(engine.data_dir());

    for (source, present) in &availability {
        let status = if *present { "available" } else { "missing" };
        let center = source
            .center
            .map(|[lat, lon]| format!("{:.4}, {:.4}", lat, lon))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<16} {:<22} {:<10} centre: {}",
            title_case(&source.name),
            source.file,
            status,
            center
        );
    }

    let missing = availability.iter().filter(|(_, present)| !present).count();
    info!(
        total = availability.len(),
        missing,
        data_dir = %engine.data_dir().display(),
        "City catalog checked"
    );
}

//! Synergy Radar - vendor consolidation value and risk analysis
//!
//! A CLI tool that loads a table of scored vendor-switch recommendations,
//! applies what-if assumptions, and renders portfolio, pod and timeline
//! views as Markdown or JSON reports.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (missing plan table, invalid data or assumptions, bad config)

mod analysis;
mod cli;
mod config;
mod data;
mod error;
mod graph;
mod models;
mod report;
mod session;

use analysis::filter::distinct_sorted;
use analysis::{filter_rows, format_dollars, generate_summary_text, sort_rows, RowFilter};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use data::DataPaths;
use report::{DashboardReport, ReportMetadata};
use session::Session;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration first so its verbosity applies to logging
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(config.log_level(&args));

    info!("Synergy Radar v{}", env!("CARGO_PKG_VERSION"));
    match config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config) {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .synergy-radar.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the data directory, assumptions and report options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over the CLI verbosity flags.
fn init_logging(level: tracing::Level) {
    let level = LevelFilter::from_level(level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete load → compute → report workflow.
fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    // Step 1: Load the plan table once
    println!("📥 Loading plan table...");
    let paths = DataPaths::from(&config.data);
    let mut session = Session::open(&paths)?;
    let table = Arc::clone(session.table());
    println!(
        "   {} recommendations from {}",
        table.records.len(),
        table.source.display()
    );
    if let Some(ref sites) = table.sites {
        debug!("Site directory: {} entries", sites.len());
    }
    if let Some(ref vendors) = table.vendors {
        debug!("Vendor directory: {} entries", vendors.len());
    }

    // Step 2: Baseline under default assumptions, then the requested scenario
    println!("🧮 Computing value and risk...");
    let baseline_npv = session
        .reset()
        .context("Plan table violates the data contract")?
        .portfolio
        .portfolio_npv_3y;

    session
        .apply(config.assumptions)
        .context("Invalid assumptions")?;
    debug!("Assumptions: {:?}", session.assumptions());
    let result = session
        .current()
        .context("No result after applying assumptions")?;

    // Step 3: Filter and sort the recommendation list
    let filter = RowFilter {
        pod: args.pod.clone(),
        risk_labels: args.risk.clone(),
        categories: args.category.clone(),
        region: args.region.clone(),
        quarter: args.quarter.clone(),
    };
    warn_unknown_keys(&filter, result);

    let mut shown = filter_rows(&result.rows, &filter);
    sort_rows(&mut shown, config.report.sort);
    info!(
        "{} of {} recommendations match the filters",
        shown.len(),
        result.rows.len()
    );

    // Step 4: Build the report
    println!("📝 Generating report...");
    let sections = args.view.sections();

    let max_edges = config
        .report
        .max_graph_edges
        .clamp(graph::MIN_MAX_EDGES, graph::MAX_MAX_EDGES);
    if max_edges != config.report.max_graph_edges {
        warn!(
            "max_graph_edges {} out of range, using {}",
            config.report.max_graph_edges, max_edges
        );
    }
    let topology = sections.graph.then(|| {
        graph::build_topology(
            &shown,
            max_edges,
            table.sites.as_ref(),
            table.vendors.as_ref(),
        )
    });

    let duration = start_time.elapsed().as_secs_f64();
    let metadata = ReportMetadata {
        source: table.source.display().to_string(),
        generated_at: Utc::now(),
        rows_loaded: table.records.len(),
        rows_shown: shown.len(),
        duration_seconds: duration,
    };

    let report = DashboardReport::build(
        metadata,
        sections,
        result,
        &shown,
        config.report.top_pods,
        topology,
    );

    // Step 5: Render and save
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = output_path(&config, &args);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 Portfolio Summary:");
    for line in generate_summary_text(&result.portfolio).lines() {
        println!("   {}", line);
    }

    let npv_delta = result.portfolio.portfolio_npv_3y - baseline_npv;
    if npv_delta != 0.0 {
        let sign = if npv_delta < 0.0 { "-" } else { "+" };
        println!(
            "   Scenario vs default assumptions: {}${} NPV",
            sign,
            format_dollars(npv_delta.abs())
        );
    }
    println!("   Duration: {:.1}s", duration);
    println!("\n✅ Report saved to: {}", output_path.display());

    Ok(())
}

/// Report path: explicit --output, else the configured one with the
/// extension matching the format.
fn output_path(config: &Config, args: &Args) -> PathBuf {
    if let Some(ref output) = args.output {
        return output.clone();
    }

    let mut path = PathBuf::from(&config.general.output);
    if args.format == OutputFormat::Json && path.extension().is_some_and(|ext| ext == "md") {
        path.set_extension("json");
    }
    path
}

/// Point out filter keys that match nothing in the table.
fn warn_unknown_keys(filter: &RowFilter, result: &models::AggregateResult) {
    if let Some(ref pod) = filter.pod {
        if result.pod(pod).is_none() {
            let pods = distinct_sorted(&result.rows, |r| r.record.pod_id.as_str());
            warn!("Unknown pod '{}' (available: {})", pod, pods.join(", "));
        }
    }

    if let Some(ref quarter) = filter.quarter {
        if result.quarter(quarter).is_none() {
            let quarters = distinct_sorted(&result.rows, |r| r.record.quarter.as_str());
            warn!(
                "Unknown quarter '{}' (available: {})",
                quarter,
                quarters.join(", ")
            );
        }
    }

    if let Some(ref region) = filter.region {
        let regions = distinct_sorted(&result.rows, |r| r.record.region.as_str());
        if !regions.contains(region) {
            warn!("Unknown region '{}' (available: {})", region, regions.join(", "));
        }
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is initialized, so problems go to stderr. Returns
/// the path the config came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(CONFIG_FILE_NAME)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("⚠️  Failed to load config: {:#}", e);
            Ok((Config::default(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;

    #[test]
    fn test_output_path_follows_format() {
        let config = Config::default();
        let mut args = make_args();
        assert_eq!(output_path(&config, &args), PathBuf::from("synergy_report.md"));

        args.format = OutputFormat::Json;
        assert_eq!(output_path(&config, &args), PathBuf::from("synergy_report.json"));

        args.output = Some(PathBuf::from("out/report.md"));
        assert_eq!(output_path(&config, &args), PathBuf::from("out/report.md"));
    }
}

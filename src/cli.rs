//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::SortOrder;
use crate::graph::{MAX_MAX_EDGES, MIN_MAX_EDGES};
use crate::models::{
    AssumptionBounds, RiskLabel, AMBER_PENALTY_BOUNDS, AR_DAY_VALUE_BOUNDS,
    COST_PER_SWITCH_BOUNDS, RED_PENALTY_BOUNDS,
};
use crate::report::Sections;
use clap::Parser;
use std::path::PathBuf;

/// Synergy Radar - vendor consolidation value and risk for site portfolios
///
/// Loads a plan table of scored vendor-switch recommendations, applies
/// what-if assumptions, and reports expected value, NPV, payback, pod
/// strategy and the implementation timeline.
///
/// Examples:
///   synergy-radar
///   synergy-radar --data-dir ./exports --amber-penalty 20 --red-penalty 50
///   synergy-radar --view radar --pod 3 --risk Green,Amber --sort fit-score
///   synergy-radar --view graph --region Midwest --max-edges 40 --format json
///   synergy-radar --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory containing plan_table.csv (and optionally sites.csv, vendors.csv)
    ///
    /// Falls back to ./data when the table is not found there.
    #[arg(short, long, value_name = "DIR", env = "SYNERGY_RADAR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Expected-value discount for Amber recommendations, in percent (0-50)
    #[arg(long, value_name = "PCT")]
    pub amber_penalty: Option<f64>,

    /// Expected-value discount for Red recommendations, in percent (0-75)
    #[arg(long, value_name = "PCT")]
    pub red_penalty: Option<f64>,

    /// Implementation cost of one switch, in dollars (500-5000)
    #[arg(long, value_name = "DOLLARS")]
    pub cost_per_switch: Option<f64>,

    /// Value of one day of A/R improvement, in dollars (100-1000)
    #[arg(long, value_name = "DOLLARS")]
    pub ar_day_value: Option<f64>,

    /// Ignore assumptions from the config file and start from defaults
    #[arg(long)]
    pub reset_assumptions: bool,

    /// Dashboard view to render
    #[arg(long, default_value = "all", value_name = "VIEW")]
    pub view: View,

    /// Only show recommendations of this pod
    #[arg(long, value_name = "POD")]
    pub pod: Option<String>,

    /// Risk tiers to show (comma-separated)
    ///
    /// Example: --risk Green,Amber
    #[arg(long, value_name = "LABELS", value_delimiter = ',', value_parser = parse_risk_label)]
    pub risk: Option<Vec<RiskLabel>>,

    /// Vendor categories to show (comma-separated)
    ///
    /// Example: --category Lab,RCM
    #[arg(long, value_name = "CATEGORIES", value_delimiter = ',')]
    pub category: Option<Vec<String>>,

    /// Only show recommendations in this region
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Only show recommendations scheduled in this quarter
    #[arg(long, value_name = "QUARTER")]
    pub quarter: Option<String>,

    /// Order of the recommendation list
    #[arg(long, value_name = "ORDER")]
    pub sort: Option<SortBy>,

    /// Number of pods in the summary overview
    #[arg(long, value_name = "COUNT")]
    pub top_pods: Option<usize>,

    /// Maximum connections in the graph view (10-50)
    #[arg(long, value_name = "COUNT")]
    pub max_edges: Option<usize>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path for the report
    ///
    /// Default: from config or synergy_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .synergy-radar.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .synergy-radar.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum View {
    /// Value creation summary
    Summary,
    /// Recommendations grouped by pod
    Radar,
    /// Quarter-by-quarter plan
    Timeline,
    /// Site/vendor topology
    Graph,
    /// Every view
    #[default]
    All,
}

impl View {
    pub fn sections(&self) -> Sections {
        match self {
            View::Summary => Sections {
                summary: true,
                ..Sections::default()
            },
            View::Radar => Sections {
                radar: true,
                ..Sections::default()
            },
            View::Timeline => Sections {
                timeline: true,
                ..Sections::default()
            },
            View::Graph => Sections {
                graph: true,
                ..Sections::default()
            },
            View::All => Sections::all(),
        }
    }
}

/// Recommendation order for --sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortBy {
    /// Pod, then NPV within the pod
    PodPriority,
    /// Fit score, high to low
    FitScore,
    /// 3-year NPV, high to low
    Npv,
    /// Green first
    Risk,
}

impl From<SortBy> for SortOrder {
    fn from(sort: SortBy) -> Self {
        match sort {
            SortBy::PodPriority => SortOrder::PodPriority,
            SortBy::FitScore => SortOrder::FitScore,
            SortBy::Npv => SortOrder::Npv,
            SortBy::Risk => SortOrder::Risk,
        }
    }
}

fn parse_risk_label(s: &str) -> Result<RiskLabel, String> {
    RiskLabel::parse(s).ok_or_else(|| format!("unknown risk label '{}' (expected Green, Amber or Red)", s))
}

fn check_bounds(value: Option<f64>, bounds: &AssumptionBounds, flag: &str) -> Result<(), String> {
    match value {
        Some(v) if !(v.is_finite() && (bounds.min..=bounds.max).contains(&v)) => Err(format!(
            "{} must be between {} and {}",
            flag, bounds.min, bounds.max
        )),
        _ => Ok(()),
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Validate assumption ranges
        check_bounds(self.amber_penalty, &AMBER_PENALTY_BOUNDS, "--amber-penalty")?;
        check_bounds(self.red_penalty, &RED_PENALTY_BOUNDS, "--red-penalty")?;
        check_bounds(self.cost_per_switch, &COST_PER_SWITCH_BOUNDS, "--cost-per-switch")?;
        check_bounds(self.ar_day_value, &AR_DAY_VALUE_BOUNDS, "--ar-day-value")?;

        // Validate graph edge limit
        if let Some(max_edges) = self.max_edges {
            if !(MIN_MAX_EDGES..=MAX_MAX_EDGES).contains(&max_edges) {
                return Err(format!(
                    "Max edges must be between {} and {}",
                    MIN_MAX_EDGES, MAX_MAX_EDGES
                ));
            }
        }

        if self.top_pods == Some(0) {
            return Err("Top pods must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate data directory if provided
        if let Some(ref dir) = self.data_dir {
            if dir.exists() && !dir.is_dir() {
                return Err(format!("Data path is not a directory: {}", dir.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            data_dir: None,
            amber_penalty: None,
            red_penalty: None,
            cost_per_switch: None,
            ar_day_value: None,
            reset_assumptions: false,
            view: View::All,
            pod: None,
            risk: None,
            category: None,
            region: None,
            quarter: None,
            sort: None,
            top_pods: None,
            max_edges: None,
            format: OutputFormat::Markdown,
            output: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "synergy-radar",
            "--amber-penalty",
            "20",
            "--risk",
            "Green,Red",
            "--category",
            "Lab,RCM",
            "--view",
            "radar",
            "--sort",
            "fit-score",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.amber_penalty, Some(20.0));
        assert_eq!(args.risk, Some(vec![RiskLabel::Green, RiskLabel::Red]));
        assert_eq!(args.category, Some(vec!["Lab".to_string(), "RCM".to_string()]));
        assert_eq!(args.view, View::Radar);
        assert_eq!(args.sort, Some(SortBy::FitScore));
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_unknown_risk_label_rejected() {
        let parsed = Args::try_parse_from(["synergy-radar", "--risk", "Blue"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_validation_assumption_bounds() {
        let mut args = make_args();
        args.red_penalty = Some(80.0);
        assert!(args.validate().is_err());

        args.red_penalty = Some(75.0);
        assert!(args.validate().is_ok());

        args.cost_per_switch = Some(f64::NAN);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_max_edges() {
        let mut args = make_args();
        args.max_edges = Some(5);
        assert!(args.validate().is_err());

        args.max_edges = Some(50);
        assert!(args.validate().is_ok());

        args.top_pods = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.max_edges = Some(500);
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_view_sections() {
        assert_eq!(View::All.sections(), Sections::all());
        let graph = View::Graph.sections();
        assert!(graph.graph);
        assert!(!graph.summary && !graph.radar && !graph.timeline);
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}

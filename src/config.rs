//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.synergy-radar.toml` files.

use crate::analysis::SortOrder;
use crate::graph::DEFAULT_MAX_EDGES;
use crate::models::Assumptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".synergy-radar.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input table locations.
    #[serde(default)]
    pub data: DataConfig,

    /// Starting what-if assumptions.
    #[serde(default)]
    pub assumptions: Assumptions,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "synergy_report.md".to_string()
}

/// Where the input tables live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory searched first for the plan table.
    #[serde(default = "default_data_dir")]
    pub dir: String,

    #[serde(default = "default_plan_table")]
    pub plan_table: String,

    #[serde(default = "default_sites")]
    pub sites: String,

    #[serde(default = "default_vendors")]
    pub vendors: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            plan_table: default_plan_table(),
            sites: default_sites(),
            vendors: default_vendors(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_plan_table() -> String {
    "plan_table.csv".to_string()
}

fn default_sites() -> String {
    "sites.csv".to_string()
}

fn default_vendors() -> String {
    "vendors.csv".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Pods listed in the summary overview.
    #[serde(default = "default_top_pods")]
    pub top_pods: usize,

    /// Edge limit of the topology view.
    #[serde(default = "default_max_graph_edges")]
    pub max_graph_edges: usize,

    /// Row order of the radar view.
    #[serde(default)]
    pub sort: SortOrder,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_pods: default_top_pods(),
            max_graph_edges: default_max_graph_edges(),
            sort: SortOrder::default(),
        }
    }
}

fn default_top_pods() -> usize {
    5
}

fn default_max_graph_edges() -> usize {
    DEFAULT_MAX_EDGES
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.synergy-radar.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.data_dir {
            self.data.dir = dir.display().to_string();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        // Assumptions
        if args.reset_assumptions {
            self.assumptions = Assumptions::default();
        }
        if let Some(amber) = args.amber_penalty {
            self.assumptions.amber_penalty_pct = amber;
        }
        if let Some(red) = args.red_penalty {
            self.assumptions.red_penalty_pct = red;
        }
        if let Some(cost) = args.cost_per_switch {
            self.assumptions.cost_per_switch = cost;
        }
        if let Some(ar) = args.ar_day_value {
            self.assumptions.ar_day_value = ar;
        }

        // Report settings
        if let Some(top_pods) = args.top_pods {
            self.report.top_pods = top_pods;
        }
        if let Some(max_edges) = args.max_edges {
            self.report.max_graph_edges = max_edges;
        }
        if let Some(sort) = args.sort {
            self.report.sort = sort.into();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level after merging: `--quiet` wins over a verbose config file.
    pub fn log_level(&self, args: &crate::cli::Args) -> tracing::Level {
        if self.general.verbose && !args.quiet {
            tracing::Level::DEBUG
        } else {
            args.log_level()
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use crate::cli::SortBy;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "synergy_report.md");
        assert_eq!(config.data.dir, "data");
        assert_eq!(config.data.plan_table, "plan_table.csv");
        assert_eq!(config.assumptions, Assumptions::default());
        assert_eq!(config.report.top_pods, 5);
        assert_eq!(config.report.max_graph_edges, 25);
        assert_eq!(config.report.sort, SortOrder::PodPriority);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_report.md"
verbose = true

[data]
dir = "exports"

[assumptions]
amber_penalty_pct = 20.0
cost_per_switch = 2500.0

[report]
top_pods = 3
sort = "fit-score"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_report.md");
        assert!(config.general.verbose);
        assert_eq!(config.data.dir, "exports");
        assert_eq!(config.data.sites, "sites.csv");
        assert_eq!(config.assumptions.amber_penalty_pct, 20.0);
        assert_eq!(config.assumptions.red_penalty_pct, 25.0);
        assert_eq!(config.assumptions.cost_per_switch, 2500.0);
        assert_eq!(config.report.top_pods, 3);
        assert_eq!(config.report.max_graph_edges, 25);
        assert_eq!(config.report.sort, SortOrder::FitScore);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[assumptions]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_merge_only_explicit_args() {
        let mut config: Config = toml::from_str(
            r#"
[assumptions]
amber_penalty_pct = 30.0
red_penalty_pct = 40.0

[report]
max_graph_edges = 40
"#,
        )
        .unwrap();

        let mut args = make_args();
        args.red_penalty = Some(50.0);
        args.sort = Some(SortBy::Npv);
        args.data_dir = Some(PathBuf::from("exports"));
        config.merge_with_args(&args);

        assert_eq!(config.assumptions.amber_penalty_pct, 30.0);
        assert_eq!(config.assumptions.red_penalty_pct, 50.0);
        assert_eq!(config.report.max_graph_edges, 40);
        assert_eq!(config.report.sort, SortOrder::Npv);
        assert_eq!(config.data.dir, "exports");
        assert_eq!(config.general.output, "synergy_report.md");
    }

    #[test]
    fn test_verbose_config_sets_log_level() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        let mut args = make_args();
        config.merge_with_args(&args);
        assert_eq!(config.log_level(&args), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(config.log_level(&args), tracing::Level::ERROR);

        let mut plain = Config::default();
        args.quiet = false;
        plain.merge_with_args(&args);
        assert_eq!(plain.log_level(&args), tracing::Level::INFO);

        args.verbose = true;
        plain.merge_with_args(&args);
        assert_eq!(plain.log_level(&args), tracing::Level::DEBUG);
    }

    #[test]
    fn test_reset_assumptions_ignores_file_values() {
        let mut config = Config::default();
        config.assumptions.amber_penalty_pct = 45.0;
        config.assumptions.ar_day_value = 900.0;

        let mut args = make_args();
        args.reset_assumptions = true;
        args.cost_per_switch = Some(3000.0);
        config.merge_with_args(&args);

        assert_eq!(config.assumptions.amber_penalty_pct, 10.0);
        assert_eq!(config.assumptions.ar_day_value, 500.0);
        assert_eq!(config.assumptions.cost_per_switch, 3000.0);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[report]\ntop_pods = 2\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.report.top_pods, 2);

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[report\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }
}

//! CSV table loading.
//!
//! Parses the plan table and the optional site/vendor directories.
//! Expected plan table columns:
//!   site_id, vendor_id, pod_id, site_name, vendor_name, region, category,
//!   ehr_system, quarter, p_adoption, risk_label, fit_score, fit_label,
//!   integration_quality, price_delta, days_ar_delta

use crate::models::{Recommendation, Site, Vendor};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where to look for the input tables.
#[derive(Debug, Clone)]
pub struct DataPaths {
    /// Directories searched in order for the plan table.
    pub search_dirs: Vec<PathBuf>,
    pub plan_table: String,
    pub sites: String,
    pub vendors: String,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            search_dirs: vec![PathBuf::from("data")],
            plan_table: "plan_table.csv".to_string(),
            sites: "sites.csv".to_string(),
            vendors: "vendors.csv".to_string(),
        }
    }
}

impl From<&crate::config::DataConfig> for DataPaths {
    fn from(config: &crate::config::DataConfig) -> Self {
        let mut search_dirs = vec![PathBuf::from(&config.dir)];
        let fallback = PathBuf::from("data");
        if !search_dirs.contains(&fallback) {
            search_dirs.push(fallback);
        }

        Self {
            search_dirs,
            plan_table: config.plan_table.clone(),
            sites: config.sites.clone(),
            vendors: config.vendors.clone(),
        }
    }
}

impl DataPaths {
    /// Find the first existing plan table among the search directories.
    pub fn resolve_plan_table(&self) -> Result<PathBuf> {
        let candidates: Vec<PathBuf> = self
            .search_dirs
            .iter()
            .map(|dir| dir.join(&self.plan_table))
            .collect();

        for candidate in &candidates {
            if candidate.is_file() {
                debug!("Found plan table at {}", candidate.display());
                return Ok(candidate.clone());
            }
        }

        let tried: Vec<String> = candidates.iter().map(|c| c.display().to_string()).collect();
        Err(anyhow::anyhow!(
            "Plan table '{}' not found (tried: {})",
            self.plan_table,
            tried.join(", ")
        ))
    }
}

/// Site attributes keyed by site id.
#[derive(Debug, Clone, Default)]
pub struct SiteDirectory {
    sites: HashMap<String, Site>,
}

impl SiteDirectory {
    pub fn new(sites: Vec<Site>) -> Self {
        Self {
            sites: sites.into_iter().map(|s| (s.site_id.clone(), s)).collect(),
        }
    }

    pub fn get(&self, site_id: &str) -> Option<&Site> {
        self.sites.get(site_id)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

/// Vendor attributes keyed by vendor id.
#[derive(Debug, Clone, Default)]
pub struct VendorDirectory {
    vendors: HashMap<String, Vendor>,
}

impl VendorDirectory {
    pub fn new(vendors: Vec<Vendor>) -> Self {
        Self {
            vendors: vendors.into_iter().map(|v| (v.vendor_id.clone(), v)).collect(),
        }
    }

    pub fn get(&self, vendor_id: &str) -> Option<&Vendor> {
        self.vendors.get(vendor_id)
    }

    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }
}

/// The immutable input of a session.
#[derive(Debug, Clone)]
pub struct PlanTable {
    /// Where the plan table was read from.
    pub source: PathBuf,
    pub records: Vec<Recommendation>,
    pub sites: Option<SiteDirectory>,
    pub vendors: Option<VendorDirectory>,
}

impl PlanTable {
    /// Build a table from records already in memory.
    pub fn from_records(source: impl Into<PathBuf>, records: Vec<Recommendation>) -> Self {
        Self {
            source: source.into(),
            records,
            sites: None,
            vendors: None,
        }
    }

    /// Load the plan table and whatever auxiliary tables sit next to it.
    pub fn load(paths: &DataPaths) -> Result<Arc<Self>> {
        let plan_path = paths.resolve_plan_table()?;
        let records = load_recommendations_file(&plan_path)?;
        info!(
            "Loaded {} recommendations from {}",
            records.len(),
            plan_path.display()
        );

        let dir = plan_path.parent().unwrap_or_else(|| Path::new("."));
        let sites = load_optional(&dir.join(&paths.sites), load_sites)
            .map(SiteDirectory::new)
            .filter(|sites| !sites.is_empty());
        let vendors = load_optional(&dir.join(&paths.vendors), load_vendors)
            .map(VendorDirectory::new)
            .filter(|vendors| !vendors.is_empty());

        Ok(Arc::new(Self {
            sites,
            vendors,
            ..Self::from_records(plan_path, records)
        }))
    }
}

/// Load recommendation records from a CSV reader.
pub fn load_recommendations<R: Read>(reader: R) -> Result<Vec<Recommendation>> {
    load_csv(reader)
}

/// Load recommendation records from a CSV file path.
pub fn load_recommendations_file(path: &Path) -> Result<Vec<Recommendation>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open plan table: {}", path.display()))?;
    load_recommendations(file)
        .with_context(|| format!("Failed to parse plan table: {}", path.display()))
}

/// Load site records from a CSV reader.
pub fn load_sites<R: Read>(reader: R) -> Result<Vec<Site>> {
    load_csv(reader)
}

/// Load vendor records from a CSV reader.
pub fn load_vendors<R: Read>(reader: R) -> Result<Vec<Vendor>> {
    load_csv(reader)
}

fn load_csv<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, result) in csv_reader.deserialize().enumerate() {
        let record: T = match result {
            Ok(record) => record,
            Err(e) => {
                // Quoted fields may span lines, so trust the reader's position.
                let context = match e.position() {
                    Some(pos) => format!("CSV parse error at line {}", pos.line()),
                    None => format!("CSV parse error in record {}", index + 1),
                };
                return Err(anyhow::Error::new(e).context(context));
            }
        };
        records.push(record);
    }

    Ok(records)
}

/// Auxiliary tables only enrich the display; any failure just skips them.
fn load_optional<T, F>(path: &Path, load: F) -> Option<Vec<T>>
where
    F: Fn(std::fs::File) -> Result<Vec<T>>,
{
    if !path.is_file() {
        debug!("No auxiliary table at {}", path.display());
        return None;
    }

    let loaded = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))
        .and_then(load);

    match loaded {
        Ok(rows) => {
            info!("Loaded {} rows from {}", rows.len(), path.display());
            Some(rows)
        }
        Err(e) => {
            warn!("Skipping {}: {:#}", path.display(), e);
            None
        }
    }
}
